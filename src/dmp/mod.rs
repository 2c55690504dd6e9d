//! Digital Motion Processor (DMP) support
//!
//! The DMP has no firmware in ROM. The host uploads the image into the
//! chip's working memory after every power-up, sets the program start
//! address and then reads fused quaternion packets from the FIFO.
//!
//! - [`loader`]: banked memory writes with optional read-back verification
//! - [`packet`]: decoding of the 28-byte DMP FIFO packet
//! - [`orientation`]: gravity, Euler and yaw/pitch/roll from a quaternion
//!
//! ## Usage Example
//!
//! ```ignore
//! # use mpu6050_motion::{Mpu6050Driver, LoadOutcome, dmp::orientation};
//! # let mut imu: Mpu6050Driver<_> = todo!();
//! let outcome = imu.dmp_initialize(&mut delay, firmware_image)?;
//! if !outcome.is_complete() {
//!     // the image did not read back intact; decide whether to retry
//! }
//! imu.set_dmp_enabled(true)?;
//!
//! if let Some(packet) = imu.dmp_current_fifo_packet(&mut delay, &clock)? {
//!     let q = packet.quaternion();
//!     let gravity = orientation::gravity(&q, orientation::ACCEL_SCALE);
//!     let ypr = orientation::yaw_pitch_roll(&q, gravity, true);
//! }
//! ```
//!
//! The firmware image is vendor-supplied and not bundled with this crate.

pub mod loader;
pub mod orientation;
pub mod packet;

pub use loader::{FirmwareLoader, LoadOutcome};
pub use orientation::{Quaternion, YawPitchRoll};
pub use packet::{DMP_PACKET_SIZE, DmpPacket};

/// Program counter the uploaded image starts executing at
pub const DMP_PROGRAM_START: u16 = 0x0400;
