//! Pulse-Echo Distance Ranging
//!
//! An HC-SR04 style ranger fires an ultrasonic burst when its trigger pin
//! sees a 10µs pulse and raises its echo pin for as long as the sound took
//! to come back. Distance is half the round trip at the speed of sound:
//!
//! ```text
//! distance_cm = echo_us × 0.034 / 2
//! ```
//!
//! A missing echo (nothing in range, sensor unplugged) shows up as a zero
//! pulse width after the 30ms timeout. That is reported as
//! [`Distance::Invalid`], which is kept apart from a genuine `0.0` cm
//! reading everywhere, including on the wire.

use crate::{
    constants::{
        protocol::DISTANCE_INVALID_SENTINEL,
        sensors::{ECHO_TIMEOUT_US, SOUND_SPEED_CM_PER_US, TRIGGER_PULSE_US, TRIGGER_SETTLE_US},
    },
    traits::{Clock, Gpio, Level, Pin, PinMode},
};

use super::pulse_in;

/// Result of one ranging attempt
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Distance {
    /// Measured distance in cm
    Valid(f32),
    /// No echo inside the timeout
    #[default]
    Invalid,
}

impl Distance {
    /// Convert an echo pulse width. Zero means the echo never came.
    pub fn from_echo_us(echo_us: u64) -> Self {
        if echo_us == 0 {
            return Distance::Invalid;
        }
        Distance::Valid(echo_us as f32 * SOUND_SPEED_CM_PER_US / 2.0)
    }

    /// Distance in cm, if valid
    pub fn cm(&self) -> Option<f32> {
        match *self {
            Distance::Valid(cm) => Some(cm),
            Distance::Invalid => None,
        }
    }

    /// `true` for [`Distance::Valid`]
    pub fn is_valid(&self) -> bool {
        matches!(self, Distance::Valid(_))
    }

    /// Value to put on the wire: the distance, or the negative sentinel
    pub fn wire_value(&self) -> f32 {
        self.cm().unwrap_or(DISTANCE_INVALID_SENTINEL)
    }

    /// Read a wire value back. Negative and non-finite values are `Invalid`.
    pub fn from_wire(value: f32) -> Self {
        if value.is_finite() && value >= 0.0 {
            Distance::Valid(value)
        } else {
            Distance::Invalid
        }
    }
}

/// Ultrasonic ranger on a trigger/echo pin pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EchoRanger {
    trigger: Pin,
    echo: Pin,
    timeout_us: u64,
}

impl EchoRanger {
    /// Ranger with the default 30ms echo timeout
    pub const fn new(trigger: Pin, echo: Pin) -> Self {
        Self { trigger, echo, timeout_us: ECHO_TIMEOUT_US }
    }

    /// Override the echo timeout
    pub const fn with_timeout_us(mut self, timeout_us: u64) -> Self {
        self.timeout_us = timeout_us;
        self
    }

    /// Configure pin directions
    pub fn begin<G: Gpio + ?Sized>(&self, gpio: &mut G) {
        gpio.set_mode(self.trigger, PinMode::Output);
        gpio.set_mode(self.echo, PinMode::Input);
    }

    /// Fire one trigger pulse and time the echo
    pub fn measure<G, C>(&self, gpio: &mut G, clock: &C) -> Distance
    where
        G: Gpio + ?Sized,
        C: Clock + ?Sized,
    {
        Distance::from_echo_us(self.echo_width_us(gpio, clock))
    }

    /// Raw echo pulse width in µs, 0 on timeout
    pub fn echo_width_us<G, C>(&self, gpio: &mut G, clock: &C) -> u64
    where
        G: Gpio + ?Sized,
        C: Clock + ?Sized,
    {
        gpio.set_output(self.trigger, Level::Low);
        clock.delay_us(TRIGGER_SETTLE_US);
        gpio.set_output(self.trigger, Level::High);
        clock.delay_us(TRIGGER_PULSE_US);
        gpio.set_output(self.trigger, Level::Low);

        pulse_in(gpio, clock, self.echo, Level::High, self.timeout_us)
    }
}
