//! Node Configuration
//!
//! Plain-data configuration for the two node roles. `Default` reproduces
//! the reference boards; override individual fields or use the `with_*`
//! builders. With the `serde` feature the pin and timing parts can be
//! loaded from a file on Linux gateways.
//!
//! Key sets (telemetry and command/feedback) are validated at construction
//! by [`TelemetryConfig::new`] and [`ProtocolConfig::new`], so a config
//! holding them is always usable.

use crate::{
    constants::{
        pins::{DHT_PIN, ECHO_PIN, INDICATOR_PIN, LUX_PIN, TRIG_PIN},
        sensors::ECHO_TIMEOUT_US,
        time::{INDICATOR_PULSE_MS, SEND_INTERVAL_MS},
    },
    protocol::ProtocolConfig,
    sensors::{ChecksumPolicy, Precision},
    telemetry::TelemetryConfig,
    traits::Pin,
};

/// Sensor board wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorPins {
    /// DHT11 data line
    pub dht: Pin,
    /// Light sensor analog input
    pub lux: Pin,
    /// Ranger trigger output
    pub trigger: Pin,
    /// Ranger echo input
    pub echo: Pin,
}

impl Default for SensorPins {
    fn default() -> Self {
        Self { dht: DHT_PIN, lux: LUX_PIN, trigger: TRIG_PIN, echo: ECHO_PIN }
    }
}

/// Sensor node settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorNodeConfig {
    /// Wiring
    pub pins: SensorPins,
    /// Telemetry interval in ms
    pub send_interval_ms: u64,
    /// Echo timeout in µs
    pub echo_timeout_us: u64,
    /// DHT checksum handling
    pub checksum: ChecksumPolicy,
    /// DHT value precision
    pub precision: Precision,
    /// Telemetry key set
    pub telemetry: TelemetryConfig,
}

impl SensorNodeConfig {
    /// Override the telemetry key set
    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Override the send interval
    pub fn with_send_interval_ms(mut self, interval_ms: u64) -> Self {
        self.send_interval_ms = interval_ms;
        self
    }

    /// Override the DHT checksum policy
    pub fn with_checksum(mut self, checksum: ChecksumPolicy) -> Self {
        self.checksum = checksum;
        self
    }
}

impl Default for SensorNodeConfig {
    fn default() -> Self {
        Self {
            pins: SensorPins::default(),
            send_interval_ms: SEND_INTERVAL_MS,
            echo_timeout_us: ECHO_TIMEOUT_US,
            checksum: ChecksumPolicy::default(),
            precision: Precision::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Optional LED that blinks when telemetry is overheard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorConfig {
    /// Indicator output
    pub pin: Pin,
    /// Time the indicator stays high
    pub pulse_ms: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self { pin: INDICATOR_PIN, pulse_ms: INDICATOR_PULSE_MS as u32 }
    }
}

/// Actuator node settings for `N` outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorNodeConfig<const N: usize = 2> {
    /// Command/feedback keys and output pins
    pub protocol: ProtocolConfig<N>,
    /// Telemetry indicator, off when `None`
    pub indicator: Option<IndicatorConfig>,
    /// Key set used to recognise telemetry for the indicator
    pub telemetry: TelemetryConfig,
}

impl<const N: usize> ActuatorNodeConfig<N> {
    /// Config for a validated protocol key set, no indicator
    pub fn new(protocol: ProtocolConfig<N>) -> Self {
        Self { protocol, indicator: None, telemetry: TelemetryConfig::default() }
    }

    /// Enable the telemetry indicator
    pub fn with_indicator(mut self, indicator: IndicatorConfig) -> Self {
        self.indicator = Some(indicator);
        self
    }

    /// Key set used to recognise telemetry
    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = telemetry;
        self
    }
}

impl Default for ActuatorNodeConfig<2> {
    fn default() -> Self {
        Self::new(ProtocolConfig::two_leds())
    }
}
