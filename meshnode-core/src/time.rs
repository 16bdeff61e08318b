//! Time management for timing-sensitive sensor reads
//!
//! Provides:
//! - `Timestamp` values in micro- or milliseconds from a [`Clock`]
//! - `Deadline`, a budget measured from one fixed start point
//! - `StdClock`, an `Instant`-backed clock for Linux hosts (requires std)
//!
//! ## Shared Deadlines
//!
//! The DHT11 decoder measures every wait against the same start point
//! rather than restarting a timer per edge. A `Deadline` is created once when
//! the start condition is released and then passed by value into each wait,
//! so a slow early bit eats into the budget of all later bits. Sensors of
//! this family rely on that coupling, and reads must reproduce it exactly.

use crate::traits::Clock;

/// Timestamp in micro- or milliseconds since an arbitrary fixed point
pub type Timestamp = u64;

/// Time budget measured from a fixed start point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: Timestamp,
    budget: u64,
}

impl Deadline {
    /// Budget of `budget` units starting at `start`
    pub const fn new(start: Timestamp, budget: u64) -> Self {
        Self { start, budget }
    }

    /// Deadline starting now on the clock's microsecond counter
    pub fn from_now_us<C: Clock + ?Sized>(clock: &C, budget_us: u64) -> Self {
        Self::new(clock.micros(), budget_us)
    }

    /// Same start point, different budget
    pub const fn with_budget(self, budget: u64) -> Self {
        Self { start: self.start, budget }
    }

    /// Start point
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    /// Units elapsed at `now`, wrapping-safe
    pub fn elapsed(&self, now: Timestamp) -> u64 {
        now.wrapping_sub(self.start)
    }

    /// Strictly more than the budget has elapsed at `now`
    pub fn expired(&self, now: Timestamp) -> bool {
        self.elapsed(now) > self.budget
    }
}

/// Monotonic clock for std hosts
///
/// Microseconds are counted from construction. `delay_us` spins for short
/// waits and sleeps for long ones.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Clock starting at zero now
    pub fn new() -> Self {
        Self { origin: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    fn millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn delay_us(&self, us: u32) {
        // Sleeping below ~1ms overshoots by far more than the DHT release pulse
        const SPIN_LIMIT_US: u32 = 1000;

        let wait = std::time::Duration::from_micros(us as u64);
        if us >= SPIN_LIMIT_US {
            std::thread::sleep(wait);
            return;
        }
        let start = std::time::Instant::now();
        while start.elapsed() < wait {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_expires_after_budget() {
        let deadline = Deadline::new(1000, 80);
        assert!(!deadline.expired(1000));
        assert!(!deadline.expired(1080));
        assert!(deadline.expired(1081));
    }

    #[test]
    fn deadline_survives_counter_wrap() {
        let deadline = Deadline::new(u64::MAX - 10, 80);
        assert_eq!(deadline.elapsed(5), 16);
        assert!(!deadline.expired(5));
        assert!(deadline.expired(70));
    }

    #[test]
    fn rebudget_keeps_start_point() {
        let ack = Deadline::new(500, 80);
        let frame = ack.with_budget(10_000);
        assert_eq!(frame.start(), 500);
        assert!(ack.expired(600));
        assert!(!frame.expired(600));
    }

    #[cfg(feature = "std")]
    #[test]
    fn std_clock_is_monotonic() {
        let clock = StdClock::new();
        let a = clock.micros();
        clock.delay_us(50);
        let b = clock.micros();
        assert!(b >= a + 50);
    }
}
