//! Gyroscope types

/// Gyroscope full-scale range (`GYRO_CONFIG.FS_SEL`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroFullScale {
    /// ±250 degrees/sec
    Dps250 = 0,
    /// ±500 degrees/sec
    Dps500 = 1,
    /// ±1000 degrees/sec
    Dps1000 = 2,
    /// ±2000 degrees/sec
    Dps2000 = 3,
}

impl GyroFullScale {
    /// Get the sensitivity in LSB/(°/s)
    #[must_use]
    pub const fn sensitivity(self) -> f32 {
        match self {
            Self::Dps250 => 131.0,
            Self::Dps500 => 65.5,
            Self::Dps1000 => 32.8,
            Self::Dps2000 => 16.4,
        }
    }

    /// Register value for `FS_SEL`
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decode the two-bit `FS_SEL` value
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Dps250,
            1 => Self::Dps500,
            2 => Self::Dps1000,
            _ => Self::Dps2000,
        }
    }
}
