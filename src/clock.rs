//! Monotonic time source for timestamps, age checks, and cleanup.
//!
//! Every timestamp and age/timeout comparison in this crate goes through a
//! single `Instant`-relative clock, including the `timestamp` fields shown
//! in JSON responses — they're informational per spec, and reusing one
//! clock everywhere is simpler than tracking both a monotonic and a wall
//! clock value. `wall_clock_secs` is kept for a caller that wants real
//! wall time instead.

use std::time::Instant;

/// Monotonic clock anchored at process start.
#[derive(Debug, Clone)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds elapsed since this clock was created.
    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall-clock time as Unix seconds, for informational JSON fields.
pub fn wall_clock_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
