//! Byte, word, block and bit-field access on top of a register transport
//!
//! [`RegisterBus`] is the only place that talks to the
//! [`RegisterInterface`]. Bit-field writes are always a full read-modify-write
//! of the containing byte; no partial-byte transaction ever reaches the bus.
//! Nothing is cached: every call is a live round trip.

use device_driver::RegisterInterface;

use crate::Error;
use crate::registers::{BitField, Register, field_mask};

/// Byte order of a 16-bit register pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteOrder {
    /// High byte at the lower address (the MPU-6050 convention)
    BigEndian,
    /// Low byte at the lower address
    LittleEndian,
}

/// Register accessor owning the bus transport
pub struct RegisterBus<I> {
    interface: I,
}

#[allow(clippy::cast_possible_truncation)]
const fn size_bits(len: usize) -> u32 {
    (len * 8) as u32
}

impl<I> RegisterBus<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Wrap a transport
    pub const fn new(interface: I) -> Self {
        Self { interface }
    }

    /// Consume the accessor and return the transport
    pub fn release(self) -> I {
        self.interface
    }

    /// Read one register
    pub fn read_byte(&mut self, address: u8) -> Result<u8, Error<I::Error>> {
        let mut buf = [0u8; 1];
        self.interface.read_register(address, 8, &mut buf)?;
        Ok(buf[0])
    }

    /// Write one register
    pub fn write_byte(&mut self, address: u8, value: u8) -> Result<(), Error<I::Error>> {
        self.interface.write_register(address, 8, &[value])?;
        Ok(())
    }

    /// Read a 16-bit register pair starting at `address`
    pub fn read_word(&mut self, address: u8, order: ByteOrder) -> Result<u16, Error<I::Error>> {
        let mut buf = [0u8; 2];
        self.interface.read_register(address, 16, &mut buf)?;
        Ok(match order {
            ByteOrder::BigEndian => u16::from_be_bytes(buf),
            ByteOrder::LittleEndian => u16::from_le_bytes(buf),
        })
    }

    /// Write a 16-bit register pair starting at `address`
    pub fn write_word(
        &mut self,
        address: u8,
        value: u16,
        order: ByteOrder,
    ) -> Result<(), Error<I::Error>> {
        let buf = match order {
            ByteOrder::BigEndian => value.to_be_bytes(),
            ByteOrder::LittleEndian => value.to_le_bytes(),
        };
        self.interface.write_register(address, 16, &buf)?;
        Ok(())
    }

    /// Read `buffer.len()` consecutive bytes starting at `address`
    pub fn read_block(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Error<I::Error>> {
        self.interface
            .read_register(address, size_bits(buffer.len()), buffer)?;
        Ok(())
    }

    /// Write `data` starting at `address` in one transaction
    ///
    /// The whole slice is sent; the transports never split or cut it.
    pub fn write_block(&mut self, address: u8, data: &[u8]) -> Result<(), Error<I::Error>> {
        self.interface
            .write_register(address, size_bits(data.len()), data)?;
        Ok(())
    }

    /// Read a single bit (0 or 1)
    pub fn read_bit(&mut self, address: u8, position: u8) -> Result<u8, Error<I::Error>> {
        self.read_bits(address, position, 1)
    }

    /// Set or clear a single bit, preserving the rest of the byte
    pub fn write_bit(
        &mut self,
        address: u8,
        position: u8,
        value: bool,
    ) -> Result<(), Error<I::Error>> {
        self.write_bits(address, position, 1, u8::from(value))
    }

    /// Read `length` bits whose most significant bit is `start`, right-aligned
    pub fn read_bits(
        &mut self,
        address: u8,
        start: u8,
        length: u8,
    ) -> Result<u8, Error<I::Error>> {
        let mask = field_mask(start, length).ok_or(Error::InvalidBitField { start, length })?;
        let byte = self.read_byte(address)?;
        Ok((byte & mask) >> (start + 1 - length))
    }

    /// Replace `length` bits whose most significant bit is `start` with the
    /// right-aligned `value`. Bits of `value` outside the field are dropped.
    ///
    /// ```text
    ///      010 value to write
    /// 76543210 bit numbers
    ///    xxx   start=4, length=3
    /// 00011100 mask
    /// 10101111 original
    /// 10100011 original & !mask
    /// 10101011 | (value << 2) & mask
    /// ```
    pub fn write_bits(
        &mut self,
        address: u8,
        start: u8,
        length: u8,
        value: u8,
    ) -> Result<(), Error<I::Error>> {
        let mask = field_mask(start, length).ok_or(Error::InvalidBitField { start, length })?;
        let current = self.read_byte(address)?;
        let shifted = (u16::from(value) << (start + 1 - length)) as u8 & mask;
        self.write_byte(address, (current & !mask) | shifted)
    }

    /// Read a named field
    pub fn read_field(&mut self, field: BitField) -> Result<u8, Error<I::Error>> {
        self.read_bits(field.register.addr(), field.start, field.length)
    }

    /// Write a named field
    pub fn write_field(&mut self, field: BitField, value: u8) -> Result<(), Error<I::Error>> {
        self.write_bits(field.register.addr(), field.start, field.length, value)
    }

    /// Read a named single-bit field as a flag
    pub fn read_flag(&mut self, field: BitField) -> Result<bool, Error<I::Error>> {
        Ok(self.read_field(field)? != 0)
    }

    /// Write a named single-bit field from a flag
    pub fn write_flag(&mut self, field: BitField, enabled: bool) -> Result<(), Error<I::Error>> {
        self.write_field(field, u8::from(enabled))
    }

    /// Read a register by name
    pub fn read_register(&mut self, register: Register) -> Result<u8, Error<I::Error>> {
        self.read_byte(register.addr())
    }

    /// Write a register by name
    pub fn write_register(&mut self, register: Register, value: u8) -> Result<(), Error<I::Error>> {
        self.write_byte(register.addr(), value)
    }
}
