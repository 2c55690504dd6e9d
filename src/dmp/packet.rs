//! DMP FIFO packet decoding
//!
//! With the stock 6-axis image the DMP emits 28-byte packets:
//!
//! | Offset | Size | Content                           |
//! |--------|------|-----------------------------------|
//! | 0      | 16   | Quaternion w, x, y, z (i32 BE)    |
//! | 16     | 6    | Accelerometer x, y, z (i16 BE)    |
//! | 22     | 6    | Gyroscope x, y, z (i16 BE)        |

use super::orientation::Quaternion;
use crate::sensors::ACCEL_LSB_PER_G_2G;

/// Size of one DMP FIFO packet in bytes
pub const DMP_PACKET_SIZE: usize = 28;

const GYRO_LSB_PER_DPS: f32 = 131.0;

/// One decoded DMP FIFO packet (raw values)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmpPacket {
    /// Quaternion components w, x, y, z as sent by the DMP
    pub quaternion: [i32; 4],
    /// Accelerometer x, y, z (raw counts)
    pub accel: [i16; 3],
    /// Gyroscope x, y, z (raw counts)
    pub gyro: [i16; 3],
}

impl DmpPacket {
    /// Decode a packet read from the FIFO
    pub fn from_bytes(bytes: &[u8; DMP_PACKET_SIZE]) -> Self {
        let long = |i: usize| i32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        let word = |i: usize| i16::from_be_bytes([bytes[i], bytes[i + 1]]);
        Self {
            quaternion: [long(0), long(4), long(8), long(12)],
            accel: [word(16), word(18), word(20)],
            gyro: [word(22), word(24), word(26)],
        }
    }

    /// Quaternion built from the raw integer components
    pub fn quaternion(&self) -> Quaternion {
        Quaternion::from_raw(self.quaternion)
    }

    /// Accelerometer in g (±2g scale)
    pub fn accel_g(&self) -> [f32; 3] {
        self.accel.map(|v| f32::from(v) / ACCEL_LSB_PER_G_2G)
    }

    /// Gyroscope in degrees per second
    ///
    /// Uses the fixed 131 LSB/dps packet scaler. It does not follow the
    /// configured full-scale range (`dmp_initialize` selects ±2000 dps).
    pub fn gyro_dps(&self) -> [f32; 3] {
        self.gyro.map(|v| f32::from(v) / GYRO_LSB_PER_DPS)
    }
}

impl From<[u8; DMP_PACKET_SIZE]> for DmpPacket {
    fn from(bytes: [u8; DMP_PACKET_SIZE]) -> Self {
        Self::from_bytes(&bytes)
    }
}
