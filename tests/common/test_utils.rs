//! Test utilities and helper functions

use crate::common::mock_interface::MockInterface;
use mpu6050_motion::{Mpu6050Driver, TimeSource};
use std::cell::Cell;
use std::rc::Rc;

/// Manual clock with microsecond resolution
///
/// Clones share the same time, so a [`MockDelay`] built from a clock
/// advances it.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    micros: Rc<Cell<u64>>,
}

#[allow(dead_code)]
impl MockClock {
    /// Clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward
    pub fn advance_us(&self, us: u64) {
        self.micros.set(self.micros.get() + us);
    }

    /// Current time in microseconds
    pub fn now_us(&self) -> u64 {
        self.micros.get()
    }
}

impl TimeSource for MockClock {
    fn now_ms(&self) -> u64 {
        self.micros.get() / 1000
    }
}

/// Mock delay implementation for testing
///
/// Returns immediately. When built with [`MockDelay::with_clock`] every delay
/// advances the clock by the requested time. The total requested delay is
/// recorded either way.
#[derive(Debug, Clone, Default)]
pub struct MockDelay {
    clock: Option<MockClock>,
    total_ns: Rc<Cell<u64>>,
}

#[allow(dead_code)]
impl MockDelay {
    /// Delay that does not move any clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay that advances `clock`
    pub fn with_clock(clock: &MockClock) -> Self {
        Self {
            clock: Some(clock.clone()),
            total_ns: Rc::default(),
        }
    }

    /// Sum of all requested delays in nanoseconds
    pub fn total_ns(&self) -> u64 {
        self.total_ns.get()
    }

    fn sleep_ns(&self, ns: u64) {
        self.total_ns.set(self.total_ns.get() + ns);
        if let Some(clock) = &self.clock {
            clock.advance_us(ns / 1000);
        }
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.sleep_ns(u64::from(ns));
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.sleep_ns(u64::from(ns));
    }
}

/// Create a mock driver for testing
/// Returns (driver, interface) where interface is a clone that shares state with the driver
pub fn create_mock_driver() -> (Mpu6050Driver<MockInterface>, MockInterface) {
    let interface = MockInterface::new();
    let interface_clone = interface.clone();
    let driver = Mpu6050Driver::new(interface).expect("Failed to create mock driver");
    (driver, interface_clone)
}

/// Create a mock driver around a prepared interface
#[allow(dead_code)]
pub fn create_driver_with(interface: &MockInterface) -> Mpu6050Driver<MockInterface> {
    Mpu6050Driver::new(interface.clone()).expect("Failed to create mock driver")
}

/// A 28-byte DMP packet where every byte is `fill`
#[allow(dead_code)]
pub fn packet_filled(fill: u8) -> Vec<u8> {
    vec![fill; 28]
}

/// Assert that two floating point values are approximately equal
#[allow(dead_code)]
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    let diff = (a - b).abs();
    assert!(
        diff < epsilon,
        "Values not equal within epsilon: {} vs {} (diff: {}, epsilon: {})",
        a,
        b,
        diff,
        epsilon
    );
}
