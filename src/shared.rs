//! Shared access to one device from several async tasks
//!
//! Every multi-register transaction on [`Mpu6050Driver`] takes `&mut self`,
//! so holding the driver is holding the bus. [`SharedMpu6050`] puts the
//! driver behind an [`embassy_sync::mutex::Mutex`]: an interrupt watch, a
//! calibration task and a configuration task can share it, with `lock()`
//! queueing callers and `try_lock()` rejecting them while another task
//! holds the device.
//!
//! # Example
//!
//! ```ignore
//! # use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! # use mpu6050_motion::SharedMpu6050;
//! static IMU: StaticCell<SharedMpu6050<CriticalSectionRawMutex, Interface>> = StaticCell::new();
//! let imu = IMU.init(SharedMpu6050::new(driver));
//!
//! // task A
//! let packet = imu.lock().await.dmp_current_fifo_packet_async(&mut delay, &clock).await?;
//!
//! // task B
//! match imu.try_lock() {
//!     Ok(mut imu) => imu.set_sleep_enabled(false)?,
//!     Err(Error::Busy) => { /* retry later */ }
//!     Err(e) => return Err(e),
//! }
//! ```

use device_driver::RegisterInterface;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use crate::Error;
use crate::device::Mpu6050Driver;

/// Mutex-guarded driver
pub struct SharedMpu6050<M: RawMutex, I> {
    inner: Mutex<M, Mpu6050Driver<I>>,
}

impl<M: RawMutex, I> SharedMpu6050<M, I> {
    /// Wrap a driver
    pub const fn new(driver: Mpu6050Driver<I>) -> Self {
        Self {
            inner: Mutex::new(driver),
        }
    }

    /// Wait for exclusive access
    pub async fn lock(&self) -> MutexGuard<'_, M, Mpu6050Driver<I>> {
        self.inner.lock().await
    }

    /// Direct access through a unique reference
    pub fn get_mut(&mut self) -> &mut Mpu6050Driver<I> {
        self.inner.get_mut()
    }

    /// Unwrap the driver
    pub fn into_inner(self) -> Mpu6050Driver<I> {
        self.inner.into_inner()
    }
}

impl<M: RawMutex, I> SharedMpu6050<M, I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Take exclusive access if nobody holds it
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if another task holds the device.
    pub fn try_lock(&self) -> Result<MutexGuard<'_, M, Mpu6050Driver<I>>, Error<I::Error>> {
        self.inner.try_lock().map_err(|_| Error::Busy)
    }
}
