//! Power management and clock selection
//!
//! `PWR_MGMT_1` holds the reset, sleep and clock-source controls. The device
//! powers up asleep on its internal oscillator; a gyro-referenced PLL is the
//! recommended clock for stable operation.

/// Clock source selection (`PWR_MGMT_1.CLKSEL`)
///
/// ```text
/// CLK_SEL | Clock Source
/// --------+--------------------------------------
/// 0       | Internal oscillator
/// 1       | PLL with X Gyro reference
/// 2       | PLL with Y Gyro reference
/// 3       | PLL with Z Gyro reference
/// 4       | PLL with external 32.768kHz reference
/// 5       | PLL with external 19.2MHz reference
/// 6       | Reserved
/// 7       | Stops the clock and keeps the timing generator in reset
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// Internal 8 MHz oscillator
    Internal = 0,
    /// PLL with X gyro reference
    PllXGyro = 1,
    /// PLL with Y gyro reference
    PllYGyro = 2,
    /// PLL with Z gyro reference
    PllZGyro = 3,
    /// PLL with external 32.768 kHz reference
    PllExternal32k = 4,
    /// PLL with external 19.2 MHz reference
    PllExternal19M = 5,
    /// Clock stopped, timing generator held in reset
    KeepReset = 7,
}

impl ClockSource {
    /// Register value for `CLKSEL`
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ClockSource {
    /// The reserved code that was read
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Internal),
            1 => Ok(Self::PllXGyro),
            2 => Ok(Self::PllYGyro),
            3 => Ok(Self::PllZGyro),
            4 => Ok(Self::PllExternal32k),
            5 => Ok(Self::PllExternal19M),
            7 => Ok(Self::KeepReset),
            other => Err(other),
        }
    }
}

/// Settling time after a device reset or wake (milliseconds)
pub const RESET_SETTLE_MS: u32 = 100;
