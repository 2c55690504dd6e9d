//! DMP firmware loader
//!
//! DMP memory is reached through three registers:
//! - `BANK_SEL` (0x6D): selects one of 32 banks of 256 bytes, plus the
//!   prefetch and user-bank flags
//! - `MEM_START_ADDR` (0x6E): address inside the selected bank
//! - `MEM_R_W` (0x6F): data port, auto-incrementing the address
//!
//! The image is written in chunks of at most [`WRITE_CHUNK_SIZE`] bytes that
//! never cross a bank boundary. With verification on, every chunk is read
//! back before the next one is written; the first mismatch stops the
//! transfer and is reported as [`LoadOutcome::VerificationFailed`]. Nothing
//! already written is rolled back.

use device_driver::RegisterInterface;

use crate::Error;
use crate::bus::{ByteOrder, RegisterBus};
use crate::registers::{BANK_SEL_MASK, BANK_SEL_PREFETCH, BANK_SEL_USER_BANK, Register};

/// Bytes written per `MEM_R_W` transaction
pub const WRITE_CHUNK_SIZE: usize = 16;

/// DMP memory bank size (bytes)
pub const DMP_BANK_SIZE: usize = 256;

/// Result of a memory block transfer
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadOutcome {
    /// Every byte was written (and read back intact when verifying)
    Complete,
    /// Read-back of a chunk differed; the transfer stopped there
    VerificationFailed {
        /// Bank of the failing chunk
        bank: u8,
        /// Start address of the failing chunk inside its bank
        address: u8,
        /// Offset of the first differing byte within the image
        offset: usize,
        /// Byte that was written
        expected: u8,
        /// Byte that was read back
        actual: u8,
    },
}

impl LoadOutcome {
    /// `true` if the whole block was transferred
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Banked DMP memory access
pub struct FirmwareLoader;

impl FirmwareLoader {
    /// Select a memory bank (masked to 0-31)
    ///
    /// # Errors
    ///
    /// Returns an error if the bus write fails.
    pub fn set_memory_bank<I>(
        bus: &mut RegisterBus<I>,
        bank: u8,
        prefetch: bool,
        user_bank: bool,
    ) -> Result<(), Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        let mut value = bank & BANK_SEL_MASK;
        if user_bank {
            value |= BANK_SEL_USER_BANK;
        }
        if prefetch {
            value |= BANK_SEL_PREFETCH;
        }
        bus.write_register(Register::BankSel, value)
    }

    /// Set the address inside the selected bank
    ///
    /// # Errors
    ///
    /// Returns an error if the bus write fails.
    pub fn set_memory_start_address<I>(
        bus: &mut RegisterBus<I>,
        address: u8,
    ) -> Result<(), Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        bus.write_register(Register::MemStartAddr, address)
    }

    /// Write the DMP program start address (`DMP_PRGM_START`, big-endian)
    ///
    /// # Errors
    ///
    /// Returns an error if the bus write fails.
    pub fn set_program_start<I>(
        bus: &mut RegisterBus<I>,
        address: u16,
    ) -> Result<(), Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        bus.write_word(Register::DmpPrgmStartH.addr(), address, ByteOrder::BigEndian)
    }

    fn select<I>(bus: &mut RegisterBus<I>, bank: u8, address: u8) -> Result<(), Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        Self::set_memory_bank(bus, bank, true, false)?;
        Self::set_memory_start_address(bus, address)
    }

    /// Write `data` into DMP memory starting at `bank`/`address`
    ///
    /// When the address passes 0xFF the transfer continues at address 0 of
    /// the next bank.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails. A read-back mismatch is
    /// not an error; it is reported through the returned [`LoadOutcome`].
    pub fn write_memory_block<I>(
        bus: &mut RegisterBus<I>,
        data: &[u8],
        mut bank: u8,
        mut address: u8,
        verify: bool,
    ) -> Result<LoadOutcome, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        Self::select(bus, bank, address)?;

        let mut readback = [0u8; WRITE_CHUNK_SIZE];
        let mut offset = 0;
        while offset < data.len() {
            let window = DMP_BANK_SIZE - usize::from(address);
            let chunk_size = WRITE_CHUNK_SIZE.min(data.len() - offset).min(window);
            let chunk = &data[offset..offset + chunk_size];
            bus.write_block(Register::MemRW.addr(), chunk)?;

            if verify {
                Self::select(bus, bank, address)?;
                let readback = &mut readback[..chunk_size];
                bus.read_block(Register::MemRW.addr(), readback)?;
                if let Some(k) = chunk.iter().zip(readback.iter()).position(|(a, b)| a != b) {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "Block write verification error, bank {} #{} ({} vs {})",
                        bank,
                        k,
                        chunk[k],
                        readback[k]
                    );
                    return Ok(LoadOutcome::VerificationFailed {
                        bank,
                        address,
                        offset: offset + k,
                        expected: chunk[k],
                        actual: readback[k],
                    });
                }
            }

            offset += chunk_size;
            let (next, wrapped) = address.overflowing_add(chunk_size_u8(chunk_size));
            address = next;
            if offset < data.len() {
                if wrapped {
                    bank = bank.wrapping_add(1);
                }
                Self::select(bus, bank, address)?;
            }
        }

        Ok(LoadOutcome::Complete)
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn chunk_size_u8(size: usize) -> u8 {
    size as u8
}
