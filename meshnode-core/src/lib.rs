//! Core of the meshnode sensor/actuator firmware
//!
//! Reads timing-based sensors, encodes telemetry and runs a loop-free
//! command/feedback protocol for nodes sharing one broadcast mesh channel.
//!
//! Key constraints:
//! - Runs on ESP32-class boards with no heap in the core
//! - Sensor reads are bounded busy-waits (10ms DHT11, 30ms ranger)
//! - A node must never react to its own broadcast echoed back to it
//!
//! ```no_run
//! use meshnode_core::{CommandProtocol, Classification};
//!
//! let protocol: CommandProtocol = CommandProtocol::default();
//! assert_eq!(protocol.classify(b"{\"led1\":true}"), Classification::Command);
//! assert_eq!(
//!     protocol.classify(b"{\"feedbackled1\":true,\"feedbackled2\":false}"),
//!     Classification::Feedback,
//! );
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod config;
pub mod constants;
pub mod errors;
pub mod node;
pub mod payload;
pub mod protocol;
pub mod scan;
pub mod scheduler;
pub mod sensors;
pub mod telemetry;
pub mod time;
pub mod traits;

#[cfg(feature = "std")]
pub mod sim;

// Public API
pub use config::{ActuatorNodeConfig, IndicatorConfig, SensorNodeConfig, SensorPins};
pub use errors::{ConfigError, DecodeError, DecodeResult, TransportError};
pub use node::{ActuatorNode, ActuatorTick, Inbound, SensorNode, SensorTick, TelemetryCycle};
pub use payload::{Payload, ValueStyle};
pub use protocol::{
    ActuatorState, Classification, CommandProtocol, InboundMessage, OutputChannel, ProtocolConfig,
};
pub use scheduler::{ChannelReadiness, PeriodicScheduler, SchedulerTick};
pub use sensors::{ChecksumPolicy, Dht11, DhtReading, Distance, EchoRanger, Precision};
pub use telemetry::{SensorSample, TelemetryConfig, TelemetryEncoder, TelemetryKeys};
pub use traits::{AnalogInput, Clock, Gpio, Level, Pin, PinMode, Transport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
