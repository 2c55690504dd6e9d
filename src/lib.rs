#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod calibration;
pub mod device;
pub mod fifo;
pub mod interface;
pub mod interrupt;
pub mod power;
pub mod registers;
pub mod sensors;
pub mod time;

// DMP support (feature-gated)
#[cfg(feature = "dmp")]
pub mod dmp;

#[cfg(feature = "async")]
pub mod shared;

// Re-export main types
pub use bus::{ByteOrder, RegisterBus};
pub use calibration::{CalibrationConfig, CalibrationReport, CalibrationTarget};
pub use device::Mpu6050Driver;
pub use fifo::{FifoState, FifoSynchronizer, SyncStep};
pub use interface::{I2cInterface, SpiInterface};
pub use interrupt::{InterruptClearMode, InterruptMode};
pub use power::ClockSource;
pub use registers::{BitField, DeviceFamily, OffsetLayout, Register};
pub use sensors::{AccelFullScale, DlpfConfig, GyroFullScale, SensorSample};
pub use time::TimeSource;

#[cfg(feature = "dmp")]
pub use dmp::{DmpPacket, LoadOutcome, Quaternion};

#[cfg(feature = "async")]
pub use shared::SharedMpu6050;

/// MPU-6050 I2C address when AD0 pin is low (default: 0x68)
///
/// Use [`I2cInterface::default()`] for this configuration.
pub const I2C_ADDRESS_AD0_LOW: u8 = 0x68;

/// MPU-6050 I2C address when AD0 pin is high (alternative: 0x69)
///
/// Use [`I2cInterface::alternative()`] for this configuration.
pub const I2C_ADDRESS_AD0_HIGH: u8 = 0x69;

/// Expected 6-bit device id of an MPU-6050 / MPU-6000 (`WHO_AM_I` bits 6..1)
pub const DEVICE_ID_MPU6050: u8 = 0x34;

/// Driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the device
    Bus(E),
    /// Bit field does not fit in one byte (`start - length + 1 < 0`, start > 7 or length outside 1..=8)
    InvalidBitField {
        /// Most significant bit of the field
        start: u8,
        /// Field width in bits
        length: u8,
    },
    /// `PWR_MGMT_1.CLKSEL` holds a reserved code (contains the value read)
    UnknownClockSource(u8),
    /// Waiting on the interrupt pin failed
    Interrupt,
    /// Another task holds the device
    Busy,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus error: {e:?}"),
            Self::InvalidBitField { start, length } => {
                write!(f, "bit field start {start} length {length} does not fit in a byte")
            }
            Self::UnknownClockSource(code) => write!(f, "reserved clock source code {code}"),
            Self::Interrupt => f.write_str("interrupt pin wait failed"),
            Self::Busy => f.write_str("device is locked by another task"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for Error<E> {}
