//! Clock Abstraction for Timing-Critical Sensor Reads
//!
//! This module provides the `Clock` trait which abstracts the three timer
//! primitives the core needs across embedded platforms and test
//! environments.
//!
//! ## Design Goals
//!
//! - **Microsecond reads**: the single-wire decoder classifies bits from
//!   ~25µs vs ~70µs pulses, so `micros()` must be cheap and monotonic
//! - **Testability**: the simulators in [`crate::sim`] drive a virtual clock
//!   that advances on every read, making busy-wait loops deterministic
//! - **Monotonic only**: wall-clock adjustments would corrupt deadlines
//!
//! ## Platform-Specific Considerations
//!
//! ### Bare Metal (no_std)
//! - Back `micros()` with a free-running hardware timer
//! - Values are taken with wrapping arithmetic, so a 32-bit counter widened
//!   to `u64` is fine as long as one read never spans a full wrap
//!
//! ### Linux/Unix
//! - Use `CLOCK_MONOTONIC` ([`crate::time::StdClock`] does this via
//!   `std::time::Instant`)
//! - `delay_us` should spin for short waits; scheduler sleeps are far too
//!   coarse for a 40µs release pulse

/// Monotonic time source with a busy-wait delay
pub trait Clock {
    /// Microseconds since an arbitrary fixed point
    fn micros(&self) -> u64;

    /// Milliseconds since the same fixed point
    fn millis(&self) -> u64;

    /// Block for `us` microseconds
    fn delay_us(&self, us: u32);

    /// Block for `ms` milliseconds
    fn delay_ms(&self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn micros(&self) -> u64 {
        (**self).micros()
    }

    fn millis(&self) -> u64 {
        (**self).millis()
    }

    fn delay_us(&self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ms(&self, ms: u32) {
        (**self).delay_ms(ms)
    }
}
