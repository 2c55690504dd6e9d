//! Wall-clock time source
//!
//! The FIFO synchronizer bounds its wait with a wall-clock deadline rather
//! than an iteration count, so it needs to know what time it is. Scheduler
//! latency therefore counts against the deadline.

/// Monotonic millisecond clock
///
/// ```ignore
/// struct EmbassyTime;
///
/// impl TimeSource for EmbassyTime {
///     fn now_ms(&self) -> u64 {
///         embassy_time::Instant::now().as_millis()
///     }
/// }
/// ```
pub trait TimeSource {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `reference_ms`, saturating at zero
    fn elapsed_since(&self, reference_ms: u64) -> u64 {
        self.now_ms().saturating_sub(reference_ms)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
