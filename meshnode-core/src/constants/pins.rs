//! Default Pin Map
//!
//! Pin numbers of the reference ESP32-S3 boards. Override them through
//! [`crate::config::SensorPins`] and the [`crate::protocol::OutputChannel`]s of a
//! [`crate::protocol::ProtocolConfig`].

use crate::traits::Pin;

/// DHT11 data line.
pub const DHT_PIN: Pin = 6;

/// Light sensor analog input.
pub const LUX_PIN: Pin = 7;

/// Ultrasonic trigger output.
pub const TRIG_PIN: Pin = 5;

/// Ultrasonic echo input.
pub const ECHO_PIN: Pin = 4;

/// First actuator output.
pub const LED1_PIN: Pin = 48;

/// Second actuator output.
pub const LED2_PIN: Pin = 47;

/// Telemetry indicator on the actuator board.
pub const INDICATOR_PIN: Pin = 7;
