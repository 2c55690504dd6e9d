//! Register definitions for the MPU-6050
//!
//! The MPU-6050 has a flat 8-bit register space. Single-bit and multi-bit
//! settings are addressed as [`BitField`]s: the most significant bit of the
//! field plus its width, matching the datasheet's `[start:start-length+1]`
//! notation.
//!
//! Offset (trim) registers moved between silicon generations, so their
//! location is resolved once from the detected [`DeviceFamily`] into an
//! [`OffsetLayout`].

/// Register addresses used by the driver
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Accelerometer X offset, high byte (MPU-6050 layout)
    XaOffsH = 0x06,
    /// Gyroscope X offset, high byte
    XgOffsH = 0x13,
    /// Sample rate divider
    SmplrtDiv = 0x19,
    /// FSYNC and DLPF configuration
    Config = 0x1A,
    GyroConfig = 0x1B,
    AccelConfig = 0x1C,
    /// FIFO enable for the sensor-data path (not the DMP path)
    FifoEn = 0x23,
    IntPinCfg = 0x37,
    IntEnable = 0x38,
    IntStatus = 0x3A,
    /// First of 14 sensor bytes: accel XYZ, temperature, gyro XYZ
    AccelXoutH = 0x3B,
    GyroXoutH = 0x43,
    UserCtrl = 0x6A,
    PwrMgmt1 = 0x6B,
    /// DMP memory bank select
    BankSel = 0x6D,
    /// DMP memory start address within the selected bank
    MemStartAddr = 0x6E,
    /// DMP memory data port, auto-increments the address
    MemRW = 0x6F,
    /// DMP program start address, 16 bits big-endian
    DmpPrgmStartH = 0x70,
    FifoCountH = 0x72,
    FifoRW = 0x74,
    WhoAmI = 0x75,
    /// Accelerometer X offset, high byte (MPU-6500 layout)
    XaOffsHAlt = 0x77,
}

impl Register {
    /// Bus address of the register
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// A named sub-byte range within one register
///
/// `start` is the most significant bit of the field (0-7) and `length` its
/// width (1-8). The field occupies bits `start-length+1 ..= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitField {
    /// Register holding the field
    pub register: Register,
    /// Most significant bit of the field
    pub start: u8,
    /// Width in bits
    pub length: u8,
}

impl BitField {
    /// Describe a field. Validity is checked by [`BitField::is_valid`] and by the
    /// bus accessor before any transaction.
    pub const fn new(register: Register, start: u8, length: u8) -> Self {
        Self {
            register,
            start,
            length,
        }
    }

    /// Single-bit field
    pub const fn bit(register: Register, position: u8) -> Self {
        Self::new(register, position, 1)
    }

    /// True if the field fits within one byte
    pub const fn is_valid(&self) -> bool {
        fits_in_byte(self.start, self.length)
    }

    /// Mask of the field bits in register position, `None` if the field does not fit
    pub const fn mask(&self) -> Option<u8> {
        field_mask(self.start, self.length)
    }
}

/// `start - length + 1 >= 0` with `start <= 7` and `1 <= length <= 8`
pub const fn fits_in_byte(start: u8, length: u8) -> bool {
    start <= 7 && length >= 1 && length <= 8 && start + 1 >= length
}

/// `((1 << length) - 1) << (start - length + 1)`
pub const fn field_mask(start: u8, length: u8) -> Option<u8> {
    if !fits_in_byte(start, length) {
        return None;
    }
    let width_mask = ((1u16 << length) - 1) as u8;
    Some(width_mask << (start + 1 - length))
}

/// Named fields used by the driver
pub mod fields {
    use super::{BitField, Register};

    /// `PWR_MGMT_1.DEVICE_RESET`
    pub const DEVICE_RESET: BitField = BitField::bit(Register::PwrMgmt1, 7);
    /// `PWR_MGMT_1.SLEEP`
    pub const SLEEP: BitField = BitField::bit(Register::PwrMgmt1, 6);
    /// `PWR_MGMT_1.CLKSEL[2:0]`
    pub const CLOCK_SOURCE: BitField = BitField::new(Register::PwrMgmt1, 2, 3);

    /// `CONFIG.DLPF_CFG[2:0]`
    pub const DLPF_CFG: BitField = BitField::new(Register::Config, 2, 3);
    /// `GYRO_CONFIG.FS_SEL[4:3]`
    pub const GYRO_FS_SEL: BitField = BitField::new(Register::GyroConfig, 4, 2);
    /// `ACCEL_CONFIG.AFS_SEL[4:3]`
    pub const ACCEL_FS_SEL: BitField = BitField::new(Register::AccelConfig, 4, 2);

    /// `FIFO_EN.XG_FIFO_EN`
    pub const XG_FIFO_EN: BitField = BitField::bit(Register::FifoEn, 6);
    /// `FIFO_EN.YG_FIFO_EN`
    pub const YG_FIFO_EN: BitField = BitField::bit(Register::FifoEn, 5);
    /// `FIFO_EN.ZG_FIFO_EN`
    pub const ZG_FIFO_EN: BitField = BitField::bit(Register::FifoEn, 4);
    /// `FIFO_EN.ACCEL_FIFO_EN`
    pub const ACCEL_FIFO_EN: BitField = BitField::bit(Register::FifoEn, 3);

    /// `INT_PIN_CFG.INT_LEVEL` (1 = active low)
    pub const INT_LEVEL: BitField = BitField::bit(Register::IntPinCfg, 7);
    /// `INT_PIN_CFG.LATCH_INT_EN`
    pub const LATCH_INT_EN: BitField = BitField::bit(Register::IntPinCfg, 5);
    /// `INT_PIN_CFG.INT_RD_CLEAR`
    pub const INT_RD_CLEAR: BitField = BitField::bit(Register::IntPinCfg, 4);
    /// `INT_PIN_CFG.FSYNC_INT_EN`
    pub const FSYNC_INT_EN: BitField = BitField::bit(Register::IntPinCfg, 2);

    /// `INT_ENABLE.FIFO_OFLOW_EN`
    pub const FIFO_OFLOW_EN: BitField = BitField::bit(Register::IntEnable, 4);
    /// `INT_ENABLE.DMP_INT_EN`
    pub const DMP_INT_EN: BitField = BitField::bit(Register::IntEnable, 1);
    /// `INT_ENABLE.DATA_RDY_EN`
    pub const DATA_RDY_EN: BitField = BitField::bit(Register::IntEnable, 0);
    /// `INT_STATUS.DATA_RDY_INT`
    pub const DATA_RDY_INT: BitField = BitField::bit(Register::IntStatus, 0);

    /// `USER_CTRL.DMP_EN`
    pub const DMP_EN: BitField = BitField::bit(Register::UserCtrl, 7);
    /// `USER_CTRL.FIFO_EN`
    pub const FIFO_ENABLE: BitField = BitField::bit(Register::UserCtrl, 6);
    /// `USER_CTRL.DMP_RESET`
    pub const DMP_RESET: BitField = BitField::bit(Register::UserCtrl, 3);
    /// `USER_CTRL.FIFO_RESET`
    pub const FIFO_RESET: BitField = BitField::bit(Register::UserCtrl, 2);
    /// `USER_CTRL[2:0]`: FIFO, I2C master and signal-path resets together
    pub const RESET_ALL: BitField = BitField::new(Register::UserCtrl, 2, 3);

    /// `WHO_AM_I[6:1]`
    pub const DEVICE_ID: BitField = BitField::new(Register::WhoAmI, 6, 6);
}

/// `BANK_SEL` flag: prefetch enabled
pub const BANK_SEL_PREFETCH: u8 = 0x40;
/// `BANK_SEL` flag: user bank
pub const BANK_SEL_USER_BANK: u8 = 0x20;
/// `BANK_SEL` bank index mask
pub const BANK_SEL_MASK: u8 = 0x1F;

/// Silicon generation, detected from the 6-bit device id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceFamily {
    /// MPU-6050 / MPU-6000 (device id 0x34)
    Mpu6050,
    /// MPU-6500 / MPU-9250 and later (device id 0x38 and above)
    Mpu6500,
}

impl DeviceFamily {
    /// Resolve the family from the `WHO_AM_I[6:1]` value
    pub const fn from_device_id(device_id: u8) -> Self {
        if device_id < 0x38 {
            Self::Mpu6050
        } else {
            Self::Mpu6500
        }
    }

    /// Where this family keeps its offset registers
    pub const fn offset_layout(self) -> OffsetLayout {
        match self {
            Self::Mpu6050 => OffsetLayout {
                accel_base: Register::XaOffsH,
                accel_stride: 2,
                gyro_base: Register::XgOffsH,
                gyro_stride: 2,
            },
            Self::Mpu6500 => OffsetLayout {
                accel_base: Register::XaOffsHAlt,
                accel_stride: 3,
                gyro_base: Register::XgOffsH,
                gyro_stride: 2,
            },
        }
    }
}

/// Location of the six 16-bit big-endian offset registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OffsetLayout {
    /// High byte of the X accelerometer offset
    pub accel_base: Register,
    /// Distance in bytes between accelerometer axes
    pub accel_stride: u8,
    /// High byte of the X gyroscope offset
    pub gyro_base: Register,
    /// Distance in bytes between gyroscope axes
    pub gyro_stride: u8,
}

impl OffsetLayout {
    /// Address of the accelerometer offset for `axis` (0 = X)
    pub const fn accel_axis(&self, axis: u8) -> u8 {
        self.accel_base.addr() + axis * self.accel_stride
    }

    /// Address of the gyroscope offset for `axis` (0 = X)
    pub const fn gyro_axis(&self, axis: u8) -> u8 {
        self.gyro_base.addr() + axis * self.gyro_stride
    }
}
