//! Sensor types for the MPU-6050
//!
//! - Accelerometer (3-axis) full-scale selection
//! - Gyroscope (3-axis) full-scale selection
//! - Shared digital low pass filter setting
//! - [`SensorSample`], one burst read of the 14 output registers
//!
//! All sensor operations are performed through methods on `Mpu6050Driver`.

pub mod accelerometer;
pub mod gyroscope;

pub use accelerometer::{ACCEL_LSB_PER_G_2G, AccelFullScale};
pub use gyroscope::GyroFullScale;

/// Number of bytes in the accel + temperature + gyro output block
pub const SENSOR_BLOCK_LEN: usize = 14;

/// Digital low pass filter setting (`CONFIG.DLPF_CFG`, 0-7)
///
/// 0 and 7 disable the filter (8 kHz gyro output rate); 1-6 step the
/// bandwidth down from 188 Hz to 5 Hz with a 1 kHz output rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DlpfConfig(u8);

impl DlpfConfig {
    /// 188 Hz bandwidth, the setting used for DMP operation
    pub const BANDWIDTH_188HZ: Self = Self(1);

    /// Build from a raw value, clamping into 0-7
    pub const fn new(value: u8) -> Self {
        Self(if value > 7 { 7 } else { value })
    }

    /// Raw `DLPF_CFG` value
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Raw accel, temperature and gyro counts from one burst read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSample {
    /// Accelerometer X, Y, Z (raw counts)
    pub accel: [i16; 3],
    /// Die temperature (raw counts)
    pub temperature: i16,
    /// Gyroscope X, Y, Z (raw counts)
    pub gyro: [i16; 3],
}

impl SensorSample {
    /// Decode the 14-byte big-endian output block starting at `ACCEL_XOUT_H`
    pub fn from_bytes(bytes: &[u8; SENSOR_BLOCK_LEN]) -> Self {
        let word = |i: usize| i16::from_be_bytes([bytes[i], bytes[i + 1]]);
        Self {
            accel: [word(0), word(2), word(4)],
            temperature: word(6),
            gyro: [word(8), word(10), word(12)],
        }
    }

    /// Acceleration in g for the configured range
    pub fn accel_g(&self, range: AccelFullScale) -> [f32; 3] {
        let s = range.sensitivity();
        self.accel.map(|v| f32::from(v) / s)
    }

    /// Angular rate in degrees per second for the configured range
    pub fn gyro_dps(&self, range: GyroFullScale) -> [f32; 3] {
        let s = range.sensitivity();
        self.gyro.map(|v| f32::from(v) / s)
    }

    /// Die temperature in °C (`raw / 340 + 36.53`)
    pub fn temperature_celsius(&self) -> f32 {
        f32::from(self.temperature) / 340.0 + 36.53
    }

    /// Roll from the accelerometer alone, in degrees
    pub fn roll_degrees(&self) -> f32 {
        let [_, y, z] = self.accel.map(f32::from);
        libm::atan2f(y, z).to_degrees()
    }

    /// Pitch from the accelerometer alone, in degrees
    pub fn pitch_degrees(&self) -> f32 {
        let [x, y, z] = self.accel.map(f32::from);
        libm::atanf(-x / libm::sqrtf(y * y + z * z)).to_degrees()
    }
}
