//! High-level driver API for the MPU-6050
//!
//! This module provides a user-friendly interface to the MPU-6050 family,
//! handling configuration, raw sensor reads, offset management, DMP firmware
//! upload, FIFO packet synchronization and offset calibration. Every getter
//! and setter is a live bus round trip; nothing is cached except the device
//! family, which is resolved once in [`Mpu6050Driver::new`].

use device_driver::RegisterInterface;

use crate::bus::{ByteOrder, RegisterBus};
use crate::calibration::{CalibrationConfig, CalibrationReport, CalibrationSession, CalibrationTarget};
use crate::fifo::{self, FifoSynchronizer};
use crate::interrupt::{InterruptClearMode, InterruptMode};
use crate::power::{ClockSource, RESET_SETTLE_MS};
use crate::registers::{DeviceFamily, OffsetLayout, Register, fields};
use crate::sensors::{AccelFullScale, DlpfConfig, GyroFullScale, SENSOR_BLOCK_LEN, SensorSample};
use crate::time::TimeSource;
use crate::{DEVICE_ID_MPU6050, Error};

#[cfg(feature = "dmp")]
use crate::dmp::{DMP_PACKET_SIZE, DMP_PROGRAM_START, DmpPacket, FirmwareLoader, LoadOutcome};

/// `SMPLRT_DIV` used with the DMP (1 kHz / (1 + 4) = 200 Hz)
#[cfg(feature = "dmp")]
const DMP_SAMPLE_RATE_DIVIDER: u8 = 0x04;

/// Main driver for the MPU-6050
pub struct Mpu6050Driver<I> {
    bus: RegisterBus<I>,
    family: DeviceFamily,
    layout: OffsetLayout,
}

impl<I> Mpu6050Driver<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Create a new driver instance
    ///
    /// Reads the device id once to pick the offset register layout. The id is
    /// not checked; use [`test_connection`](Self::test_connection) for that.
    /// Call [`initialize`](Self::initialize) or
    /// [`dmp_initialize`](Self::dmp_initialize) afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn new(interface: I) -> Result<Self, Error<I::Error>> {
        let mut bus = RegisterBus::new(interface);
        let device_id = bus.read_field(fields::DEVICE_ID)?;
        let family = DeviceFamily::from_device_id(device_id);

        #[cfg(feature = "defmt")]
        defmt::debug!("Device id {=u8:#x}, family {}", device_id, family);

        Ok(Self {
            bus,
            family,
            layout: family.offset_layout(),
        })
    }

    /// Device family detected at construction
    pub const fn family(&self) -> DeviceFamily {
        self.family
    }

    /// Offset register layout of the detected family
    pub const fn offset_layout(&self) -> OffsetLayout {
        self.layout
    }

    /// Get a mutable reference to the register accessor (for advanced usage)
    pub const fn bus_mut(&mut self) -> &mut RegisterBus<I> {
        &mut self.bus
    }

    /// Power on and prepare for general use
    ///
    /// Selects the PLL with Z gyro reference, sets ±250 dps and ±2 g, wakes
    /// the device and waits 100 ms.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    ///
    /// # Example
    ///
    /// ```ignore
    /// # use mpu6050_motion::{I2cInterface, Mpu6050Driver};
    /// let mut imu = Mpu6050Driver::new(I2cInterface::default(i2c))?;
    /// imu.initialize(&mut delay)?;
    /// let sample = imu.fetch()?;
    /// ```
    pub fn initialize<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.set_clock_source(ClockSource::PllZGyro)?;
        self.set_gyro_full_scale(GyroFullScale::Dps250)?;
        self.set_accel_full_scale(AccelFullScale::G2)?;
        self.set_sleep_enabled(false)?;
        delay.delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    /// Trigger a full device reset and wait 100 ms
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn reset<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.bus.write_flag(fields::DEVICE_RESET, true)?;
        delay.delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    /// Read the 6-bit device id (`WHO_AM_I[6:1]`, 0x34 on an MPU-6050)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn device_id(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_field(fields::DEVICE_ID)
    }

    /// `true` if the device answers with the MPU-6050 id
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn test_connection(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self.device_id()? == DEVICE_ID_MPU6050)
    }

    // ==================== POWER AND CLOCK ====================

    /// Read the sleep bit
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn sleep_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::SLEEP)
    }

    /// Enter or leave sleep mode
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_sleep_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::SLEEP, enabled)
    }

    /// Read the clock source
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownClockSource`] if the register holds the
    /// reserved code 6, or an error if communication with the device fails.
    pub fn clock_source(&mut self) -> Result<ClockSource, Error<I::Error>> {
        let bits = self.bus.read_field(fields::CLOCK_SOURCE)?;
        ClockSource::try_from(bits).map_err(Error::UnknownClockSource)
    }

    /// Select the clock source
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_clock_source(&mut self, source: ClockSource) -> Result<(), Error<I::Error>> {
        self.bus.write_field(fields::CLOCK_SOURCE, source.bits())
    }

    /// Read the sample rate divider (`SMPLRT_DIV`)
    ///
    /// Sample rate = gyroscope output rate / (1 + divider), where the
    /// gyroscope output rate is 8 kHz with the DLPF off and 1 kHz with it on.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn sample_rate_divider(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_register(Register::SmplrtDiv)
    }

    /// Write the sample rate divider
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_sample_rate_divider(&mut self, divider: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_register(Register::SmplrtDiv, divider)
    }

    /// Read the digital low pass filter setting
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn dlpf(&mut self) -> Result<DlpfConfig, Error<I::Error>> {
        Ok(DlpfConfig::new(self.bus.read_field(fields::DLPF_CFG)?))
    }

    /// Write the digital low pass filter setting
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_dlpf(&mut self, config: DlpfConfig) -> Result<(), Error<I::Error>> {
        self.bus.write_field(fields::DLPF_CFG, config.bits())
    }

    // ==================== SENSOR RANGES ====================

    /// Read the gyroscope full-scale range
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn gyro_full_scale(&mut self) -> Result<GyroFullScale, Error<I::Error>> {
        Ok(GyroFullScale::from_bits(self.bus.read_field(fields::GYRO_FS_SEL)?))
    }

    /// Set the gyroscope full-scale range
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_gyro_full_scale(&mut self, range: GyroFullScale) -> Result<(), Error<I::Error>> {
        self.bus.write_field(fields::GYRO_FS_SEL, range.bits())
    }

    /// Read the accelerometer full-scale range
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn accel_full_scale(&mut self) -> Result<AccelFullScale, Error<I::Error>> {
        Ok(AccelFullScale::from_bits(self.bus.read_field(fields::ACCEL_FS_SEL)?))
    }

    /// Set the accelerometer full-scale range
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_accel_full_scale(&mut self, range: AccelFullScale) -> Result<(), Error<I::Error>> {
        self.bus.write_field(fields::ACCEL_FS_SEL, range.bits())
    }

    // ==================== FIFO SOURCE ENABLES ====================

    /// Accelerometer samples are written to the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn accel_fifo_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::ACCEL_FIFO_EN)
    }

    /// Route accelerometer samples to the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_accel_fifo_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::ACCEL_FIFO_EN, enabled)
    }

    /// X gyroscope samples are written to the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn x_gyro_fifo_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::XG_FIFO_EN)
    }

    /// Route X gyroscope samples to the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_x_gyro_fifo_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::XG_FIFO_EN, enabled)
    }

    /// Y gyroscope samples are written to the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn y_gyro_fifo_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::YG_FIFO_EN)
    }

    /// Route Y gyroscope samples to the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_y_gyro_fifo_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::YG_FIFO_EN, enabled)
    }

    /// Z gyroscope samples are written to the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn z_gyro_fifo_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::ZG_FIFO_EN)
    }

    /// Route Z gyroscope samples to the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_z_gyro_fifo_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::ZG_FIFO_EN, enabled)
    }

    // ==================== INTERRUPTS ====================

    /// Read the interrupt pin logic level
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn interrupt_mode(&mut self) -> Result<InterruptMode, Error<I::Error>> {
        Ok(InterruptMode::from(self.bus.read_flag(fields::INT_LEVEL)?))
    }

    /// Set the interrupt pin logic level
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_interrupt_mode(&mut self, mode: InterruptMode) -> Result<(), Error<I::Error>> {
        self.bus.write_field(fields::INT_LEVEL, mode as u8)
    }

    /// The interrupt pin is held until the interrupt is cleared
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn interrupt_latch_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::LATCH_INT_EN)
    }

    /// Latch the interrupt pin (`true`) or emit 50 µs pulses (`false`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_interrupt_latch_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::LATCH_INT_EN, enabled)
    }

    /// Read how interrupt status bits are cleared
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn interrupt_clear_mode(&mut self) -> Result<InterruptClearMode, Error<I::Error>> {
        Ok(InterruptClearMode::from(self.bus.read_flag(fields::INT_RD_CLEAR)?))
    }

    /// Select how interrupt status bits are cleared
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_interrupt_clear_mode(
        &mut self,
        mode: InterruptClearMode,
    ) -> Result<(), Error<I::Error>> {
        self.bus.write_field(fields::INT_RD_CLEAR, mode as u8)
    }

    /// Read the raw `INT_ENABLE` byte
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn interrupt_enable_register(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_register(Register::IntEnable)
    }

    /// Write the raw `INT_ENABLE` byte
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_interrupt_enable_register(&mut self, value: u8) -> Result<(), Error<I::Error>> {
        self.bus.write_register(Register::IntEnable, value)
    }

    /// FSYNC pin acts as an interrupt
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn fsync_interrupt_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::FSYNC_INT_EN)
    }

    /// Use the FSYNC pin as an interrupt
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_fsync_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::FSYNC_INT_EN, enabled)
    }

    /// Data-ready interrupt enabled
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn data_ready_interrupt_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::DATA_RDY_EN)
    }

    /// Enable the data-ready interrupt
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_data_ready_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::DATA_RDY_EN, enabled)
    }

    /// DMP interrupt enabled
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn dmp_interrupt_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::DMP_INT_EN)
    }

    /// Enable the DMP interrupt
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_dmp_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::DMP_INT_EN, enabled)
    }

    /// FIFO overflow interrupt enabled
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn fifo_overflow_interrupt_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::FIFO_OFLOW_EN)
    }

    /// Enable the FIFO overflow interrupt
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_fifo_overflow_interrupt_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::FIFO_OFLOW_EN, enabled)
    }

    /// Read the raw `INT_STATUS` byte
    ///
    /// See [`crate::interrupt`] for the bit constants. Depending on the clear
    /// mode this read may clear the status bits.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn interrupt_status(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_register(Register::IntStatus)
    }

    /// Data-ready status bit
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn data_ready_status(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::DATA_RDY_INT)
    }

    // ==================== FIFO ====================

    /// FIFO enabled (`USER_CTRL.FIFO_EN`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn fifo_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::FIFO_ENABLE)
    }

    /// Enable or disable the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_fifo_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::FIFO_ENABLE, enabled)
    }

    /// Discard the FIFO contents; the bit clears itself
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn reset_fifo(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::FIFO_RESET, true)
    }

    /// Number of bytes queued in the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn fifo_count(&mut self) -> Result<u16, Error<I::Error>> {
        fifo::read_count(&mut self.bus)
    }

    /// Read `buffer.len()` bytes from the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_fifo_bytes(&mut self, buffer: &mut [u8]) -> Result<(), Error<I::Error>> {
        self.bus.read_block(Register::FifoRW.addr(), buffer)
    }

    /// Read one byte from the FIFO
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_fifo_byte(&mut self) -> Result<u8, Error<I::Error>> {
        self.bus.read_register(Register::FifoRW)
    }

    /// Wait for the freshest complete `N`-byte packet
    ///
    /// Resets the FIFO on overflow and discards stale packets. Returns
    /// `Ok(None)` if the FIFO is empty or nothing arrives within 11 s.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn current_fifo_packet<const N: usize, D, T>(
        &mut self,
        delay: &mut D,
        time: &T,
    ) -> Result<Option<[u8; N]>, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
        T: TimeSource,
    {
        FifoSynchronizer::<N>::new().run(&mut self.bus, delay, time)
    }

    // ==================== DMP CONTROL ====================

    /// DMP running (`USER_CTRL.DMP_EN`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn dmp_enabled(&mut self) -> Result<bool, Error<I::Error>> {
        self.bus.read_flag(fields::DMP_EN)
    }

    /// Start or stop the DMP
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_dmp_enabled(&mut self, enabled: bool) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::DMP_EN, enabled)
    }

    /// Reset the DMP; the bit clears itself
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn reset_dmp(&mut self) -> Result<(), Error<I::Error>> {
        self.bus.write_flag(fields::DMP_RESET, true)
    }

    // ==================== SENSOR DATA ====================

    /// Burst-read accelerometer, temperature and gyroscope
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn fetch(&mut self) -> Result<SensorSample, Error<I::Error>> {
        let mut buffer = [0u8; SENSOR_BLOCK_LEN];
        self.bus.read_block(Register::AccelXoutH.addr(), &mut buffer)?;
        Ok(SensorSample::from_bytes(&buffer))
    }

    // ==================== OFFSETS ====================

    /// Read the six offset registers: accel X, Y, Z then gyro X, Y, Z
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn offsets(&mut self) -> Result<[i16; 6], Error<I::Error>> {
        let mut offsets = [0i16; 6];
        for axis in 0..3u8 {
            let i = usize::from(axis);
            offsets[i] = self.read_offset(self.layout.accel_axis(axis))?;
            offsets[i + 3] = self.read_offset(self.layout.gyro_axis(axis))?;
        }
        Ok(offsets)
    }

    /// Write the six offset registers: accel X, Y, Z then gyro X, Y, Z
    ///
    /// Accelerometer bit 0 is a factory flag on the MPU-6050; pass the value
    /// returned by [`offsets`](Self::offsets) to keep it.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_offsets(&mut self, offsets: [i16; 6]) -> Result<(), Error<I::Error>> {
        for axis in 0..3u8 {
            let i = usize::from(axis);
            self.write_offset(self.layout.accel_axis(axis), offsets[i])?;
            self.write_offset(self.layout.gyro_axis(axis), offsets[i + 3])?;
        }
        Ok(())
    }

    /// Read the offsets and log them as a table
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn log_active_offsets(&mut self) -> Result<[i16; 6], Error<I::Error>> {
        let offsets = self.offsets()?;
        #[cfg(feature = "defmt")]
        defmt::info!(
            "OFFSETS accel X {} Y {} Z {} | gyro X {} Y {} Z {}",
            offsets[0],
            offsets[1],
            offsets[2],
            offsets[3],
            offsets[4],
            offsets[5]
        );
        Ok(offsets)
    }

    fn read_offset(&mut self, address: u8) -> Result<i16, Error<I::Error>> {
        #[allow(clippy::cast_possible_wrap)]
        let value = self.bus.read_word(address, ByteOrder::BigEndian)? as i16;
        Ok(value)
    }

    fn write_offset(&mut self, address: u8, value: i16) -> Result<(), Error<I::Error>> {
        #[allow(clippy::cast_sign_loss)]
        let raw = value as u16;
        self.bus.write_word(address, raw, ByteOrder::BigEndian)
    }

    // ==================== CALIBRATION ====================

    /// Start a calibration session (for driving the step machine directly)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn begin_calibration(
        &mut self,
        target: CalibrationTarget,
        config: &CalibrationConfig,
    ) -> Result<CalibrationSession, Error<I::Error>> {
        CalibrationSession::begin(&mut self.bus, self.layout, target, config)
    }

    /// Advance a session started with [`begin_calibration`](Self::begin_calibration)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn step_calibration(
        &mut self,
        session: &mut CalibrationSession,
    ) -> Result<crate::calibration::CalibrationStep, Error<I::Error>> {
        session.step(&mut self.bus)
    }

    /// Calibrate the accelerometer offsets; the device must rest level
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn calibrate_accel<D>(
        &mut self,
        delay: &mut D,
        config: &CalibrationConfig,
    ) -> Result<CalibrationReport, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.begin_calibration(CalibrationTarget::Accelerometer, config)?
            .run(&mut self.bus, delay)
    }

    /// Calibrate the gyroscope offsets; the device must rest still
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn calibrate_gyro<D>(
        &mut self,
        delay: &mut D,
        config: &CalibrationConfig,
    ) -> Result<CalibrationReport, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.begin_calibration(CalibrationTarget::Gyroscope, config)?
            .run(&mut self.bus, delay)
    }

    // ==================== TEARDOWN ====================

    /// Stop the DMP and disable the FSYNC and data-ready interrupts
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn close(&mut self) -> Result<(), Error<I::Error>> {
        self.set_dmp_enabled(false)?;
        self.set_fsync_interrupt_enabled(false)?;
        self.set_data_ready_interrupt_enabled(false)
    }

    /// Consume the driver and return the bus interface
    pub fn release(self) -> I {
        self.bus.release()
    }
}

// ==================== DMP METHODS ====================
// Digital Motion Processor support (requires "dmp" feature)

#[cfg(feature = "dmp")]
impl<I> Mpu6050Driver<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Reset the device, upload the DMP image and configure it for
    /// 28-byte quaternion packets
    ///
    /// # Process
    ///
    /// 1. Device reset and full signal path reset, 100 ms each
    /// 2. Wake, PLL with X gyro reference, all interrupts off, FIFO sources off
    /// 3. ±2 g, clear interrupts on any read, `SMPLRT_DIV` 4, DLPF 188 Hz
    /// 4. Upload `firmware` to bank 0 with read-back verification
    /// 5. Program start 0x0400, ±2000 dps
    /// 6. FIFO on and reset, DMP interrupt on, FIFO reset again
    /// 7. DMP left disabled; call [`set_dmp_enabled`](Self::set_dmp_enabled)
    ///
    /// The sequence always runs to the end. A failed verification is returned
    /// in the [`LoadOutcome`] for the caller to act on.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn dmp_initialize<D>(
        &mut self,
        delay: &mut D,
        firmware: &[u8],
    ) -> Result<LoadOutcome, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.reset(delay)?;
        self.bus.write_field(fields::RESET_ALL, 0b111)?;
        delay.delay_ms(RESET_SETTLE_MS);

        self.set_sleep_enabled(false)?;
        self.set_clock_source(ClockSource::PllXGyro)?;
        self.set_interrupt_enable_register(0x00)?;
        self.bus.write_register(Register::FifoEn, 0x00)?;
        self.set_accel_full_scale(AccelFullScale::G2)?;
        self.set_interrupt_clear_mode(InterruptClearMode::AnyRead)?;
        self.set_sample_rate_divider(DMP_SAMPLE_RATE_DIVIDER)?;
        self.set_dlpf(DlpfConfig::BANDWIDTH_188HZ)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Uploading {} byte DMP image", firmware.len());

        let outcome = self.write_memory_block(firmware, 0, 0, true)?;

        if !outcome.is_complete() {
            #[cfg(feature = "defmt")]
            defmt::warn!("DMP image verification failed: {}", outcome);
        }

        self.set_dmp_program_start(DMP_PROGRAM_START)?;
        self.set_gyro_full_scale(GyroFullScale::Dps2000)?;

        self.set_fifo_enabled(true)?;
        self.reset_fifo()?;
        self.set_dmp_interrupt_enabled(true)?;
        self.reset_fifo()?;
        self.set_dmp_enabled(false)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("DMP initialized");

        Ok(outcome)
    }

    /// Write `data` into DMP memory starting at `bank`/`address`
    ///
    /// See [`FirmwareLoader::write_memory_block`].
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn write_memory_block(
        &mut self,
        data: &[u8],
        bank: u8,
        address: u8,
        verify: bool,
    ) -> Result<LoadOutcome, Error<I::Error>> {
        FirmwareLoader::write_memory_block(&mut self.bus, data, bank, address, verify)
    }

    /// Select a DMP memory bank
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_memory_bank(
        &mut self,
        bank: u8,
        prefetch: bool,
        user_bank: bool,
    ) -> Result<(), Error<I::Error>> {
        FirmwareLoader::set_memory_bank(&mut self.bus, bank, prefetch, user_bank)
    }

    /// Set the address inside the selected DMP memory bank
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_memory_start_address(&mut self, address: u8) -> Result<(), Error<I::Error>> {
        FirmwareLoader::set_memory_start_address(&mut self.bus, address)
    }

    /// Set the DMP program start address
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_dmp_program_start(&mut self, address: u16) -> Result<(), Error<I::Error>> {
        FirmwareLoader::set_program_start(&mut self.bus, address)
    }

    /// Size of one DMP FIFO packet
    pub const fn dmp_packet_size(&self) -> usize {
        DMP_PACKET_SIZE
    }

    /// At least one DMP packet is queued
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn dmp_packet_available(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(usize::from(self.fifo_count()?) >= DMP_PACKET_SIZE)
    }

    /// Wait for the freshest DMP packet
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn dmp_current_fifo_packet<D, T>(
        &mut self,
        delay: &mut D,
        time: &T,
    ) -> Result<Option<DmpPacket>, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
        T: TimeSource,
    {
        Ok(self
            .current_fifo_packet::<DMP_PACKET_SIZE, _, _>(delay, time)?
            .map(DmpPacket::from))
    }
}

// ==================== ASYNC METHODS ====================
// Cooperative yield variants (requires "async" feature). Bus transactions
// stay blocking; only the waits between polls are awaited.

#[cfg(feature = "async")]
impl<I> Mpu6050Driver<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Async variant of [`current_fifo_packet`](Self::current_fifo_packet)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn current_fifo_packet_async<const N: usize, D, T>(
        &mut self,
        delay: &mut D,
        time: &T,
    ) -> Result<Option<[u8; N]>, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
        T: TimeSource,
    {
        FifoSynchronizer::<N>::new()
            .run_async(&mut self.bus, delay, time)
            .await
    }

    /// Async variant of [`calibrate_accel`](Self::calibrate_accel)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn calibrate_accel_async<D>(
        &mut self,
        delay: &mut D,
        config: &CalibrationConfig,
    ) -> Result<CalibrationReport, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.begin_calibration(CalibrationTarget::Accelerometer, config)?
            .run_async(&mut self.bus, delay)
            .await
    }

    /// Async variant of [`calibrate_gyro`](Self::calibrate_gyro)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn calibrate_gyro_async<D>(
        &mut self,
        delay: &mut D,
        config: &CalibrationConfig,
    ) -> Result<CalibrationReport, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.begin_calibration(CalibrationTarget::Gyroscope, config)?
            .run_async(&mut self.bus, delay)
            .await
    }
}

#[cfg(all(feature = "async", feature = "dmp"))]
impl<I> Mpu6050Driver<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Async variant of [`dmp_current_fifo_packet`](Self::dmp_current_fifo_packet)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn dmp_current_fifo_packet_async<D, T>(
        &mut self,
        delay: &mut D,
        time: &T,
    ) -> Result<Option<DmpPacket>, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
        T: TimeSource,
    {
        Ok(self
            .current_fifo_packet_async::<DMP_PACKET_SIZE, _, _>(delay, time)
            .await?
            .map(DmpPacket::from))
    }

    /// Latch the interrupt pin, enable the DMP interrupt and start the DMP
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn prepare_interrupt_watch(&mut self) -> Result<(), Error<I::Error>> {
        self.set_interrupt_latch_enabled(true)?;
        self.set_dmp_interrupt_enabled(true)?;
        self.set_dmp_enabled(true)
    }

    /// Fetch a packet on every rising edge of `pin` and hand it to `on_packet`
    ///
    /// Runs until `on_packet` returns [`ControlFlow::Break`]. Edges that do
    /// not yield a packet are skipped. Call
    /// [`prepare_interrupt_watch`](Self::prepare_interrupt_watch) first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Interrupt`] if waiting on the pin fails, or an error
    /// if communication with the device fails.
    ///
    /// [`ControlFlow::Break`]: core::ops::ControlFlow::Break
    pub async fn watch_interrupt<P, D, T, F>(
        &mut self,
        pin: &mut P,
        delay: &mut D,
        time: &T,
        mut on_packet: F,
    ) -> Result<(), Error<I::Error>>
    where
        P: embedded_hal_async::digital::Wait,
        D: embedded_hal_async::delay::DelayNs,
        T: TimeSource,
        F: FnMut(&DmpPacket) -> core::ops::ControlFlow<()>,
    {
        loop {
            pin.wait_for_rising_edge()
                .await
                .map_err(|_| Error::Interrupt)?;

            if let Some(packet) = self.dmp_current_fifo_packet_async(delay, time).await? {
                if on_packet(&packet).is_break() {
                    return Ok(());
                }
            } else {
                #[cfg(feature = "defmt")]
                defmt::debug!("Interrupt edge without a DMP packet");
            }
        }
    }
}
