//! Monotonic timing for trace events

use std::time::Instant;

/// Timestamps taken at one call boundary, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark {
    /// Time since the clock was started
    pub elapsed: f64,
    /// Time since the previous mark (or clock start for the first mark)
    pub interval: f64,
}

/// Monotonic clock over the trace session
///
/// Both fields of a [`Mark`] come from a single `Instant::now()` reading,
/// so `elapsed` is non-decreasing across marks and `interval` is never
/// negative.
#[derive(Debug)]
pub struct TraceClock {
    start: Instant,
    last: Instant,
}

impl TraceClock {
    pub fn start() -> Self {
        let now = Instant::now();
        Self { start: now, last: now }
    }

    /// Take timestamps for the current boundary and reset the interval
    /// reference point
    pub fn mark(&mut self) -> Mark {
        let now = Instant::now();
        let mark = Mark {
            elapsed: now.duration_since(self.start).as_secs_f64(),
            interval: now.duration_since(self.last).as_secs_f64(),
        };
        self.last = now;
        mark
    }
}
