//! Shared fixtures for integration tests
//!
//! Wires the simulated clock, GPIO bank and transport to the reference pin
//! map so each test only scripts what it cares about.

#![allow(dead_code)]

use meshnode_core::{
    constants::pins::{DHT_PIN, ECHO_PIN, LUX_PIN, TRIG_PIN},
    sim::{echo_waveform, DhtWaveform, SimClock, SimGpio, SimTransport, Trigger},
};

/// Simulated sensor board
pub struct SensorBench {
    pub clock: SimClock,
    pub gpio: SimGpio,
    pub transport: SimTransport,
}

impl SensorBench {
    /// Board at t = 1s with nothing connected and a ready radio
    pub fn new() -> Self {
        let clock = SimClock::new(1_000_000);
        Self {
            gpio: SimGpio::new(clock.clone()),
            clock,
            transport: SimTransport::ready(),
        }
    }

    /// DHT11 answering every read with `wave`
    pub fn with_dht(mut self, wave: DhtWaveform) -> Self {
        self.gpio.script(DHT_PIN, wave.build(), Trigger::InputMode);
        self
    }

    /// Ranger echoing `width_us` after every trigger
    pub fn with_echo(mut self, width_us: u64) -> Self {
        self.gpio.script(ECHO_PIN, echo_waveform(200, width_us), Trigger::FallingEdge(TRIG_PIN));
        self
    }

    /// Light sensor level
    pub fn with_lux(mut self, lux: u16) -> Self {
        self.gpio.set_analog(LUX_PIN, lux);
        self
    }
}

/// Echo width for a target `cm` away
pub fn echo_us_for_cm(cm: f32) -> u64 {
    (cm * 2.0 / 0.034) as u64
}

/// Assert two floats agree to within `tolerance`
pub fn assert_close(actual: f32, expected: f32, tolerance: f32) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
