//! Interrupt pin configuration
//!
//! The INT pin can signal raw data ready, FIFO overflow and the DMP packet
//! interrupt. With the DMP running, a rising edge means a new packet has
//! been queued; `Mpu6050Driver::prepare_interrupt_watch` (feature `async`) sets the
//! device up for that use.

/// INT pin logic level (`INT_PIN_CFG.INT_LEVEL`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptMode {
    /// Pin is driven high while the interrupt is asserted
    ActiveHigh = 0,
    /// Pin is driven low while the interrupt is asserted
    ActiveLow = 1,
}

impl From<bool> for InterruptMode {
    fn from(bit: bool) -> Self {
        if bit { Self::ActiveLow } else { Self::ActiveHigh }
    }
}

/// How interrupt status bits are cleared (`INT_PIN_CFG.INT_RD_CLEAR`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptClearMode {
    /// Cleared only by reading `INT_STATUS`
    StatusRead = 0,
    /// Cleared by any register read
    AnyRead = 1,
}

impl From<bool> for InterruptClearMode {
    fn from(bit: bool) -> Self {
        if bit { Self::AnyRead } else { Self::StatusRead }
    }
}

/// `INT_STATUS.FIFO_OFLOW_INT`
pub const INT_STATUS_FIFO_OVERFLOW: u8 = 1 << 4;
/// `INT_STATUS.DMP_INT`
pub const INT_STATUS_DMP: u8 = 1 << 1;
/// `INT_STATUS.DATA_RDY_INT`
pub const INT_STATUS_DATA_READY: u8 = 1 << 0;
