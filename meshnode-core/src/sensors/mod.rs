//! Timing-Based Sensor Drivers
//!
//! ## Overview
//!
//! Both sensors on the reference board are read without a clock line or a
//! bus controller. Everything is recovered from how long a GPIO stays at one
//! level:
//!
//! - [`dht`]: DHT11 humidity/temperature over a self-clocked single wire.
//!   A `0` bit is a ~26µs high pulse, a `1` bit ~70µs.
//! - [`ranging`]: HC-SR04 style pulse-echo ranger. Distance is proportional
//!   to the echo pulse width.
//!
//! ## Blocking Model
//!
//! Reads busy-wait inside a single scheduler tick. Every wait is bounded by
//! a [`Deadline`] so a disconnected or stuck sensor stalls the tick for at
//! most the sensor's budget (10ms for the DHT11, 30ms for the ranger) and
//! then reports a timeout. There is no cancellation and no retry within a
//! cycle.

pub mod dht;
pub mod ranging;

pub use dht::{ChecksumPolicy, Dht11, DhtReading, Frame, Precision, PulseTrain};
pub use ranging::{Distance, EchoRanger};

use crate::time::Deadline;
use crate::traits::{Clock, Gpio, Level, Pin};

/// A wait ran past its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Expired;

/// Spin while `pin` reads `level`.
///
/// The deadline is checked after every sample, so the line is always read
/// at least once even when the budget is already spent.
pub(crate) fn wait_while<G, C>(
    gpio: &mut G,
    clock: &C,
    pin: Pin,
    level: Level,
    deadline: Deadline,
) -> Result<(), Expired>
where
    G: Gpio + ?Sized,
    C: Clock + ?Sized,
{
    while gpio.read_input(pin) == level {
        if deadline.expired(clock.micros()) {
            return Err(Expired);
        }
    }
    Ok(())
}

/// Width of the next pulse at `level` on `pin`, in µs.
///
/// Waits for any pulse already in progress to end, then for the next one to
/// start, then times it. All three phases share one `timeout_us` budget
/// from the call. Returns 0 on timeout, so callers must treat 0 as "no
/// pulse" rather than a zero-width pulse.
pub fn pulse_in<G, C>(gpio: &mut G, clock: &C, pin: Pin, level: Level, timeout_us: u64) -> u64
where
    G: Gpio + ?Sized,
    C: Clock + ?Sized,
{
    let deadline = Deadline::from_now_us(clock, timeout_us);
    let idle = if level.is_high() { Level::Low } else { Level::High };

    if wait_while(gpio, clock, pin, level, deadline).is_err() {
        return 0;
    }
    if wait_while(gpio, clock, pin, idle, deadline).is_err() {
        return 0;
    }
    let rise = clock.micros();
    if wait_while(gpio, clock, pin, level, deadline).is_err() {
        return 0;
    }
    clock.micros().wrapping_sub(rise)
}
