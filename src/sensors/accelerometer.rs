//! Accelerometer types
//!
//! Provides the full-scale range selection for the MPU-6050's 3-axis
//! accelerometer and the raw-to-g conversion.

/// Accelerometer full-scale range (`ACCEL_CONFIG.AFS_SEL`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelFullScale {
    /// ±2g range (most sensitive, least range)
    G2 = 0,
    /// ±4g range
    G4 = 1,
    /// ±8g range
    G8 = 2,
    /// ±16g range (least sensitive, most range)
    G16 = 3,
}

impl AccelFullScale {
    /// Get the sensitivity in LSB/g
    #[must_use]
    pub const fn sensitivity(self) -> f32 {
        match self {
            Self::G2 => 16384.0,
            Self::G4 => 8192.0,
            Self::G8 => 4096.0,
            Self::G16 => 2048.0,
        }
    }

    /// Register value for `AFS_SEL`
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decode the two-bit `AFS_SEL` value; every code is defined
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::G2,
            1 => Self::G4,
            2 => Self::G8,
            _ => Self::G16,
        }
    }
}

/// Raw accelerometer counts per g at ±2g, the range the DMP is configured for
pub const ACCEL_LSB_PER_G_2G: f32 = 16384.0;
