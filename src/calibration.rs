//! PI offset calibration
//!
//! Drives the accelerometer or gyroscope offset registers until the raw
//! readings of a resting, level device are zero (accelerometer Z: +1g).
//!
//! One session runs `loops` passes of up to 100 PI iterations. Each
//! iteration reads the three raw axes, feeds `-reading` into the integral
//! and writes `round((kP * error + integral) / divisor)` back. A pass ends
//! early once the error sum has stayed small long enough; after every pass
//! both gains decay by 0.75 and the offsets are rewritten from the integral
//! alone. Bit 0 of each accelerometer offset register is a factory
//! temperature-compensation flag and is never changed.
//!
//! When the session ends, successfully or not, the FIFO and DMP are reset
//! and the DMP is re-enabled if it was running before.
//!
//! # Example
//!
//! ```ignore
//! # use mpu6050_motion::{Mpu6050Driver, CalibrationConfig};
//! # let mut imu: Mpu6050Driver<_> = todo!();
//! let report = imu.calibrate_accel(&mut delay, &CalibrationConfig::accelerometer(6))?;
//! if report.converged {
//!     imu.log_active_offsets()?;
//! }
//! ```

use device_driver::RegisterInterface;

use crate::Error;
use crate::bus::{ByteOrder, RegisterBus};
use crate::registers::{OffsetLayout, Register, fields};

/// PI iterations per pass
pub const ITERATIONS_PER_PASS: u8 = 100;

/// Delay between iterations in the blocking and async wrappers, in milliseconds
pub const ITERATION_YIELD_MS: u32 = 1;

/// Default number of passes
pub const DEFAULT_LOOPS: u8 = 6;

/// Default bound on restarts of a pass that is not converging
pub const DEFAULT_MAX_RESTARTS: u16 = 10;

const GRAVITY_COUNTS: i32 = 16384;
const RESTART_ERROR_SUM: u32 = 1000;
const BREAK_ERROR_SUM: u32 = 100;
const SETTLED_SAMPLES: u16 = 10;
const SETTLED_ITERATIONS: u8 = 10;
const GAIN_DECAY: f32 = 0.75;
const INTEGRAL_RATE: f32 = 0.001;

/// Which sensor's offsets to calibrate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationTarget {
    /// Accelerometer offsets, raw readings at `ACCEL_XOUT_H`
    Accelerometer,
    /// Gyroscope offsets, raw readings at `GYRO_XOUT_H`
    Gyroscope,
}

impl CalibrationTarget {
    /// First raw output register
    pub const fn reading_base(self) -> Register {
        match self {
            Self::Accelerometer => Register::AccelXoutH,
            Self::Gyroscope => Register::GyroXoutH,
        }
    }

    /// Raw counts per offset LSB
    pub const fn divisor(self) -> f32 {
        match self {
            Self::Accelerometer => 8.0,
            Self::Gyroscope => 4.0,
        }
    }

    /// Scale applied to the error sum before the settle check
    const fn settle_scale(self) -> f32 {
        match self {
            Self::Accelerometer => 0.05,
            Self::Gyroscope => 1.0,
        }
    }

    /// Offset register of `axis` within `layout`
    pub const fn offset_address(self, layout: &OffsetLayout, axis: u8) -> u8 {
        match self {
            Self::Accelerometer => layout.accel_axis(axis),
            Self::Gyroscope => layout.gyro_axis(axis),
        }
    }

    const fn preserves_bit_zero(self) -> bool {
        matches!(self, Self::Accelerometer)
    }
}

/// Gains and pass count for one calibration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationConfig {
    /// Proportional gain
    pub kp: f32,
    /// Integral gain
    pub ki: f32,
    /// Number of passes
    pub loops: u8,
    /// Log progress at info level
    pub output: bool,
    /// Restarts allowed before the session gives up
    pub max_restarts: u16,
}

/// `(100 - map(loops, 1, 5, 20, 0)) * 0.01`
fn gain_scale(loops: u8) -> f32 {
    let mapped = (f32::from(loops) - 1.0) * (0.0 - 20.0) / (5.0 - 1.0) + 20.0;
    (100.0 - mapped) * 0.01
}

impl CalibrationConfig {
    /// Accelerometer gains (`kP = 0.3`, `kI = 20`) scaled for `loops` passes
    pub fn accelerometer(loops: u8) -> Self {
        Self::scheduled(0.3, 20.0, loops)
    }

    /// Gyroscope gains (`kP = 0.3`, `kI = 90`) scaled for `loops` passes
    pub fn gyroscope(loops: u8) -> Self {
        Self::scheduled(0.3, 90.0, loops)
    }

    fn scheduled(kp: f32, ki: f32, loops: u8) -> Self {
        let x = gain_scale(loops);
        Self {
            kp: kp * x,
            ki: ki * x,
            loops,
            output: true,
            max_restarts: DEFAULT_MAX_RESTARTS,
        }
    }

    /// Enable or disable progress logging
    #[must_use]
    pub const fn with_output(mut self, output: bool) -> Self {
        self.output = output;
        self
    }

    /// Set the restart bound
    #[must_use]
    pub const fn with_max_restarts(mut self, max_restarts: u16) -> Self {
        self.max_restarts = max_restarts;
        self
    }
}

/// Summary of a finished calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationReport {
    /// Which offsets were calibrated
    pub target: CalibrationTarget,
    /// Offsets written at the end, X, Y, Z
    pub offsets: [i16; 3],
    /// Passes completed
    pub passes: u8,
    /// PI iterations run across all passes
    pub iterations: u32,
    /// Times a pass was restarted because the error stayed above 1000
    pub restarts: u16,
    /// Error sum of the last iteration
    pub final_error_sum: u32,
    /// The last pass ended on the settle condition
    pub converged: bool,
}

/// Result of one [`CalibrationSession::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationStep {
    /// Yield, then step again
    Pending,
    /// The session finished and device state was restored
    Done(CalibrationReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Finished,
}

/// One calibration run as a step machine
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    target: CalibrationTarget,
    layout: OffsetLayout,
    kp: f32,
    ki: f32,
    loops: u8,
    output: bool,
    max_restarts: u16,
    integral: [f32; 3],
    bit_zero: [u16; 3],
    pass: u8,
    iteration: u8,
    error_samples: u16,
    error_sum: u32,
    iterations: u32,
    restarts: u16,
    converged: bool,
    abandoned: bool,
    dmp_was_enabled: bool,
    phase: Phase,
}

fn round_half_up(value: f32) -> i32 {
    #[allow(clippy::cast_possible_truncation)]
    let rounded = libm::floorf(value + 0.5) as i32;
    rounded
}

impl CalibrationSession {
    /// Start a session: seed the integrals from the current offset registers,
    /// then stop the DMP
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn begin<I>(
        bus: &mut RegisterBus<I>,
        layout: OffsetLayout,
        target: CalibrationTarget,
        config: &CalibrationConfig,
    ) -> Result<Self, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        // Seed before touching the DMP so a failed read leaves it running
        let mut integral = [0.0; 3];
        let mut bit_zero = [0; 3];
        for axis in 0..3u8 {
            let address = target.offset_address(&layout, axis);
            let raw = bus.read_word(address, ByteOrder::BigEndian)?;
            #[allow(clippy::cast_possible_wrap)]
            let offset = f32::from(raw as i16);
            if target.preserves_bit_zero() {
                bit_zero[usize::from(axis)] = raw & 1;
            }
            integral[usize::from(axis)] = offset * target.divisor();
        }

        let dmp_was_enabled = bus.read_flag(fields::DMP_EN)?;
        if dmp_was_enabled {
            bus.write_flag(fields::DMP_EN, false)?;
        }

        let session = Self {
            target,
            layout,
            kp: config.kp,
            ki: config.ki,
            loops: config.loops,
            output: config.output,
            max_restarts: config.max_restarts,
            integral,
            bit_zero,
            pass: 0,
            iteration: 0,
            error_samples: 0,
            error_sum: 0,
            iterations: 0,
            restarts: 0,
            converged: false,
            abandoned: false,
            dmp_was_enabled,
            phase: Phase::Running,
        };

        if session.output {
            #[cfg(feature = "defmt")]
            defmt::info!("Calibrating {} offsets over {} passes", target, session.loops);
        }

        Ok(session)
    }

    /// Which offsets this session calibrates
    pub const fn target(&self) -> CalibrationTarget {
        self.target
    }

    /// Passes completed so far
    pub const fn passes(&self) -> u8 {
        self.pass
    }

    /// Error sum of the latest iteration
    pub const fn error_sum(&self) -> u32 {
        self.error_sum
    }

    /// Run one PI iteration, or finish the session
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails. The FIFO/DMP restore is
    /// still attempted and the session is finished. A failed restore is
    /// logged and the original error is returned.
    pub fn step<I>(&mut self, bus: &mut RegisterBus<I>) -> Result<CalibrationStep, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        match self.advance(bus) {
            Ok(step) => Ok(step),
            Err(error) => {
                if self.phase == Phase::Running {
                    self.phase = Phase::Finished;
                    if self.restore(bus).is_err() {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("FIFO/DMP restore after a calibration error failed");
                    }
                }
                Err(error)
            }
        }
    }

    fn advance<I>(&mut self, bus: &mut RegisterBus<I>) -> Result<CalibrationStep, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        if self.phase == Phase::Finished || self.abandoned || self.pass >= self.loops {
            return self.finish(bus);
        }

        self.error_sum = self.iterate(bus)?;
        self.iterations += 1;

        let mut give_up = false;
        if self.iteration == ITERATIONS_PER_PASS - 1 && self.error_sum > RESTART_ERROR_SUM {
            self.iteration = 0;
            self.restarts += 1;
            if self.output {
                #[cfg(feature = "defmt")]
                defmt::info!("* restart ({} error sum {})", self.restarts, self.error_sum);
            }
            give_up = self.restarts > self.max_restarts;
        }

        #[allow(clippy::cast_precision_loss)]
        let scaled_sum = self.error_sum as f32 * self.target.settle_scale();
        if scaled_sum < 5.0 {
            self.error_samples += 1;
        }

        let settled = self.error_sum < BREAK_ERROR_SUM
            && self.iteration > SETTLED_ITERATIONS
            && self.error_samples >= SETTLED_SAMPLES;

        self.iteration += 1;
        if settled || give_up || self.iteration >= ITERATIONS_PER_PASS {
            self.converged = settled;
            self.end_pass(bus)?;
            if give_up {
                #[cfg(feature = "defmt")]
                defmt::warn!("Calibration abandoned after {} restarts", self.restarts);
                self.abandoned = true;
            }
            if self.abandoned || self.pass >= self.loops {
                return self.finish(bus);
            }
        }

        Ok(CalibrationStep::Pending)
    }

    /// One PI update of all three axes, returns the error sum
    fn iterate<I>(&mut self, bus: &mut RegisterBus<I>) -> Result<u32, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        let base = self.target.reading_base().addr();
        let mut error_sum = 0u32;
        for axis in 0..3u8 {
            let raw = bus.read_word(base + axis * 2, ByteOrder::BigEndian)?;
            #[allow(clippy::cast_possible_wrap)]
            let mut reading = i32::from(raw as i16);
            if self.target == CalibrationTarget::Accelerometer && axis == 2 {
                reading -= GRAVITY_COUNTS;
            }
            error_sum += reading.unsigned_abs();

            #[allow(clippy::cast_precision_loss)]
            let error = -(reading as f32);
            let i = usize::from(axis);
            self.integral[i] += error * INTEGRAL_RATE * self.ki;
            let output = self.kp * error + self.integral[i];
            self.write_offset(bus, axis, output)?;
        }
        Ok(error_sum)
    }

    fn end_pass<I>(&mut self, bus: &mut RegisterBus<I>) -> Result<(), Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        self.kp *= GAIN_DECAY;
        self.ki *= GAIN_DECAY;
        for axis in 0..3u8 {
            self.write_offset(bus, axis, self.integral[usize::from(axis)])?;
        }
        self.pass += 1;
        self.iteration = 0;
        self.error_samples = 0;
        if self.output {
            #[cfg(feature = "defmt")]
            defmt::info!(
                "pass {}/{} done, error sum {}",
                self.pass,
                self.loops,
                self.error_sum
            );
        }
        Ok(())
    }

    /// Offset register value for a PI output, with bit 0 preserved on the
    /// accelerometer path
    fn offset_value(&self, axis: u8, output: f32) -> i16 {
        let scaled = round_half_up(output / self.target.divisor())
            .clamp(i32::from(i16::MIN), i32::from(i16::MAX));
        #[allow(clippy::cast_possible_truncation)]
        let mut value = scaled as i16;
        if self.target.preserves_bit_zero() {
            #[allow(clippy::cast_possible_wrap)]
            let bit = self.bit_zero[usize::from(axis)] as i16;
            value = (value & !1) | bit;
        }
        value
    }

    fn write_offset<I>(
        &self,
        bus: &mut RegisterBus<I>,
        axis: u8,
        output: f32,
    ) -> Result<(), Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        let address = self.target.offset_address(&self.layout, axis);
        #[allow(clippy::cast_sign_loss)]
        let value = self.offset_value(axis, output) as u16;
        bus.write_word(address, value, ByteOrder::BigEndian)
    }

    fn restore<I>(&self, bus: &mut RegisterBus<I>) -> Result<(), Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        bus.write_flag(fields::FIFO_RESET, true)?;
        bus.write_flag(fields::DMP_RESET, true)?;
        if self.dmp_was_enabled {
            bus.write_flag(fields::DMP_EN, true)?;
        }
        Ok(())
    }

    fn finish<I>(&mut self, bus: &mut RegisterBus<I>) -> Result<CalibrationStep, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
    {
        if self.phase == Phase::Running {
            self.phase = Phase::Finished;
            self.restore(bus)?;
        }
        Ok(CalibrationStep::Done(self.report()))
    }

    /// Summary of the session so far
    pub fn report(&self) -> CalibrationReport {
        let mut offsets = [0i16; 3];
        for (axis, offset) in (0..3u8).zip(offsets.iter_mut()) {
            *offset = self.offset_value(axis, self.integral[usize::from(axis)]);
        }
        CalibrationReport {
            target: self.target,
            offsets,
            passes: self.pass,
            iterations: self.iterations,
            restarts: self.restarts,
            final_error_sum: self.error_sum,
            converged: self.converged,
        }
    }

    /// Step until done, sleeping [`ITERATION_YIELD_MS`] between iterations
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn run<I, D>(
        mut self,
        bus: &mut RegisterBus<I>,
        delay: &mut D,
    ) -> Result<CalibrationReport, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
        D: embedded_hal::delay::DelayNs,
    {
        loop {
            match self.step(bus)? {
                CalibrationStep::Pending => delay.delay_ms(ITERATION_YIELD_MS),
                CalibrationStep::Done(report) => return Ok(report),
            }
        }
    }

    /// Async variant of [`run`](Self::run)
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    #[cfg(feature = "async")]
    pub async fn run_async<I, D>(
        mut self,
        bus: &mut RegisterBus<I>,
        delay: &mut D,
    ) -> Result<CalibrationReport, Error<I::Error>>
    where
        I: RegisterInterface<AddressType = u8>,
        D: embedded_hal_async::delay::DelayNs,
    {
        loop {
            match self.step(bus)? {
                CalibrationStep::Pending => delay.delay_ms(ITERATION_YIELD_MS).await,
                CalibrationStep::Done(report) => return Ok(report),
            }
        }
    }
}
