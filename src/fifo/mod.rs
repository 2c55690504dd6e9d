//! Overflow-safe FIFO packet synchronization
//!
//! The MPU-6050 FIFO is a 1024-byte ring that the DMP fills continuously.
//! A reader that falls behind ends up with several queued packets, or with a
//! wrapped and corrupted buffer. [`FifoSynchronizer`] always hands back the
//! freshest complete packet:
//!
//! - more than [`OVERFLOW_THRESHOLD`] bytes queued: reset the FIFO and wait
//!   for the next packet to arrive
//! - more than one packet but below the threshold: discard the surplus in
//!   [`DRAIN_CHUNK`]-byte reads, re-reading the count on the next poll
//! - exactly one packet: read it in one block
//!
//! The synchronizer is a step machine. [`FifoSynchronizer::poll`] performs
//! at most one reset or one drain and returns [`SyncStep::Pending`] wherever
//! the caller should yield. The deadline is checked on every count read, so
//! a FIFO that keeps overflowing still ends in [`SyncStep::NoData`]. [`FifoSynchronizer::run`] and
//! [`FifoSynchronizer::run_async`] wrap it with a delay between polls.
//!
//! # Example
//!
//! ```ignore
//! # use mpu6050_motion::fifo::{FifoSynchronizer, SyncStep};
//! let mut sync = FifoSynchronizer::<28>::new();
//! loop {
//!     match sync.poll(&mut bus, clock.now_ms())? {
//!         SyncStep::Pending => continue,
//!         SyncStep::Packet(packet) => break Some(packet),
//!         SyncStep::NoData => break None,
//!     }
//! }
//! ```

use device_driver::RegisterInterface;

use crate::Error;
use crate::bus::{ByteOrder, RegisterBus};
use crate::registers::{Register, fields};
use crate::time::TimeSource;

/// FIFO size in bytes
pub const FIFO_SIZE: u16 = 1024;

/// Queued byte count above which the FIFO is reset instead of drained
pub const OVERFLOW_THRESHOLD: u16 = 200;

/// Largest read used to discard surplus bytes
pub const DRAIN_CHUNK: usize = 32;

/// Wall-clock budget for one synchronization, in milliseconds
pub const DEADLINE_MS: u64 = 11_000;

/// Delay between polls in the blocking and async wrappers, in microseconds
pub const POLL_YIELD_US: u32 = 500;

/// Synchronizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoState {
    /// No synchronization in flight
    Idle,
    /// Reading the count and discarding surplus packets
    Draining,
    /// FIFO was reset after an overflow, waiting for fresh bytes
    WaitingFresh,
    /// Exactly one packet is queued
    Ready,
    /// A packet was handed out
    Returned,
    /// The deadline elapsed before a packet became available
    TimedOut,
}

/// Result of one [`FifoSynchronizer::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncStep<const N: usize> {
    /// Yield and poll again
    Pending,
    /// The freshest complete packet
    Packet([u8; N]),
    /// Nothing queued, or the deadline elapsed
    NoData,
}

/// Step machine returning the freshest `N`-byte packet from the FIFO
#[derive(Debug, Clone)]
pub struct FifoSynchronizer<const N: usize> {
    state: FifoState,
    started_at_ms: u64,
}

impl<const N: usize> Default for FifoSynchronizer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FifoSynchronizer<N> {
    /// Create an idle synchronizer for packets of `N` bytes
    pub const fn new() -> Self {
        Self {
            state: FifoState::Idle,
            started_at_ms: 0,
        }
    }

    /// Current state
    pub const fn state(&self) -> FifoState {
        self.state
    }

    /// Packet length this synchronizer was built for
    pub const fn packet_len(&self) -> usize {
        N
    }

    fn expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_at_ms) > DEADLINE_MS
    }

    /// Advance the synchronization
    ///
    /// A poll after [`SyncStep::Packet`] or [`SyncStep::NoData`] starts a new
    /// synchronization with a fresh deadline.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails. The synchronizer goes back
    /// to [`FifoState::Idle`].
    pub fn poll<I>(
        &mut self,
        bus: &mut RegisterBus<I>,
        now_ms: u64,
    ) -> Result<SyncStep<N>, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        let step = self.advance(bus, now_ms);
        if step.is_err() {
            self.state = FifoState::Idle;
        }
        step
    }

    fn advance<I>(
        &mut self,
        bus: &mut RegisterBus<I>,
        now_ms: u64,
    ) -> Result<SyncStep<N>, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        #[allow(clippy::cast_possible_truncation)]
        let length = N as u16;

        if matches!(
            self.state,
            FifoState::Idle | FifoState::Returned | FifoState::TimedOut
        ) {
            self.started_at_ms = now_ms;
            self.state = FifoState::Draining;
        }

        loop {
            match self.state {
                FifoState::WaitingFresh => {
                    let count = read_count(bus)?;
                    if count == 0 {
                        if self.expired(now_ms) {
                            return Ok(self.time_out());
                        }
                        return Ok(SyncStep::Pending);
                    }
                    self.state = FifoState::Draining;
                }
                FifoState::Draining => {
                    let count = read_count(bus)?;
                    if count == 0 {
                        self.state = FifoState::Idle;
                        return Ok(SyncStep::NoData);
                    }
                    if self.expired(now_ms) {
                        return Ok(self.time_out());
                    }
                    if count > OVERFLOW_THRESHOLD {
                        #[cfg(feature = "defmt")]
                        defmt::debug!("FIFO overflow ({} bytes), resetting", count);
                        bus.write_flag(fields::FIFO_RESET, true)?;
                        self.state = FifoState::WaitingFresh;
                        return Ok(SyncStep::Pending);
                    }
                    if count > length {
                        // One drain per poll; the count is re-read next round
                        drain(bus, count - length)?;
                        return Ok(SyncStep::Pending);
                    }
                    if count < length {
                        return Ok(SyncStep::Pending);
                    }
                    self.state = FifoState::Ready;
                }
                FifoState::Ready => {
                    let mut packet = [0u8; N];
                    bus.read_block(Register::FifoRW.addr(), &mut packet)?;
                    self.state = FifoState::Returned;
                    return Ok(SyncStep::Packet(packet));
                }
                FifoState::Idle | FifoState::Returned | FifoState::TimedOut => {
                    self.state = FifoState::Draining;
                }
            }
        }
    }

    fn time_out(&mut self) -> SyncStep<N> {
        #[cfg(feature = "defmt")]
        defmt::debug!("FIFO packet wait timed out after {} ms", DEADLINE_MS);
        self.state = FifoState::TimedOut;
        SyncStep::NoData
    }

    /// Poll until a packet is available or the deadline elapses, sleeping
    /// [`POLL_YIELD_US`] between polls
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn run<I, D, T>(
        &mut self,
        bus: &mut RegisterBus<I>,
        delay: &mut D,
        time: &T,
    ) -> Result<Option<[u8; N]>, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
        D: embedded_hal::delay::DelayNs,
        T: TimeSource,
    {
        loop {
            match self.poll(bus, time.now_ms())? {
                SyncStep::Pending => delay.delay_us(POLL_YIELD_US),
                SyncStep::Packet(packet) => return Ok(Some(packet)),
                SyncStep::NoData => return Ok(None),
            }
        }
    }

    /// Async variant of [`run`](Self::run)
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    #[cfg(feature = "async")]
    pub async fn run_async<I, D, T>(
        &mut self,
        bus: &mut RegisterBus<I>,
        delay: &mut D,
        time: &T,
    ) -> Result<Option<[u8; N]>, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
        D: embedded_hal_async::delay::DelayNs,
        T: TimeSource,
    {
        loop {
            match self.poll(bus, time.now_ms())? {
                SyncStep::Pending => delay.delay_us(POLL_YIELD_US).await,
                SyncStep::Packet(packet) => return Ok(Some(packet)),
                SyncStep::NoData => return Ok(None),
            }
        }
    }
}

/// Read the 16-bit FIFO byte count
pub(crate) fn read_count<I>(bus: &mut RegisterBus<I>) -> Result<u16, Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
{
    bus.read_word(Register::FifoCountH.addr(), ByteOrder::BigEndian)
}

/// Discard `surplus` bytes in chunks of at most [`DRAIN_CHUNK`]
fn drain<I>(bus: &mut RegisterBus<I>, surplus: u16) -> Result<(), Error<I::Error>>
where
    I: RegisterInterface<AddressType = u8>,
{
    let mut scratch = [0u8; DRAIN_CHUNK];
    let mut remaining = usize::from(surplus);
    while remaining > 0 {
        let chunk = remaining.min(DRAIN_CHUNK);
        bus.read_block(Register::FifoRW.addr(), &mut scratch[..chunk])?;
        remaining -= chunk;
    }
    Ok(())
}
