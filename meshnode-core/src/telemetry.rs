//! Telemetry Encoding
//!
//! A sensor node broadcasts one flat JSON object per cycle:
//!
//! ```text
//! {"temp":23.4,"hum":45.0,"lux":1234,"dist":17.0}
//! ```
//!
//! Floats carry one decimal place, lux is an integer ADC count and a missing
//! echo is sent as `-1.0`. Key names and value quoting are configurable
//! because the fleet runs two firmware generations: [`TelemetryConfig::compact`]
//! and [`TelemetryConfig::verbose`] reproduce both.
//!
//! Encoding goes straight into a bounded [`Payload`]; see the payload module
//! for what happens when the keys are too long to fit.

use libm::roundf;

use crate::{
    errors::ConfigError,
    payload::{ObjectWriter, Payload, ValueStyle},
    protocol::validate_key,
    scan,
    sensors::Distance,
};

/// One cycle's worth of readings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSample {
    /// Relative humidity in percent
    pub humidity: f32,
    /// Temperature in °C
    pub temperature: f32,
    /// Raw light level
    pub lux: u16,
    /// Ranger result
    pub distance: Distance,
}

impl SensorSample {
    /// Read a telemetry payload back. All four keys must be present.
    ///
    /// Accepts bare and quoted values regardless of the configured style.
    pub fn parse(text: &str, config: &TelemetryConfig) -> Option<Self> {
        let keys = &config.keys;
        let temperature = scan::number_value(text, keys.temperature)?;
        let humidity = scan::number_value(text, keys.humidity)?;
        let lux = scan::number_value(text, keys.lux)?;
        let distance = scan::number_value(text, keys.distance)?;

        Some(Self {
            humidity,
            temperature,
            lux: roundf(lux).clamp(0.0, u16::MAX as f32) as u16,
            distance: Distance::from_wire(distance),
        })
    }
}

/// JSON key names for the four telemetry fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryKeys {
    /// Temperature key
    pub temperature: &'static str,
    /// Humidity key
    pub humidity: &'static str,
    /// Light level key
    pub lux: &'static str,
    /// Distance key
    pub distance: &'static str,
}

impl TelemetryKeys {
    fn all(&self) -> [&'static str; 4] {
        [self.temperature, self.humidity, self.lux, self.distance]
    }
}

/// Key names plus value style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryConfig {
    keys: TelemetryKeys,
    style: ValueStyle,
}

impl TelemetryConfig {
    /// `temp`/`hum`/`lux`/`dist` with bare values
    pub const fn compact() -> Self {
        Self {
            keys: TelemetryKeys { temperature: "temp", humidity: "hum", lux: "lux", distance: "dist" },
            style: ValueStyle::Bare,
        }
    }

    /// `temp`/`humidity`/`lux`/`distance` with quoted values
    pub const fn verbose() -> Self {
        Self {
            keys: TelemetryKeys {
                temperature: "temp",
                humidity: "humidity",
                lux: "lux",
                distance: "distance",
            },
            style: ValueStyle::Quoted,
        }
    }

    /// Custom key set. Keys must be non-empty, distinct and free of JSON syntax.
    pub fn new(keys: TelemetryKeys, style: ValueStyle) -> Result<Self, ConfigError> {
        let all = keys.all();
        for (i, &key) in all.iter().enumerate() {
            validate_key(key)?;
            if all[..i].iter().any(|other| other.eq_ignore_ascii_case(key)) {
                return Err(ConfigError::DuplicateKey { key });
            }
        }
        Ok(Self { keys, style })
    }

    /// Key names
    pub fn keys(&self) -> &TelemetryKeys {
        &self.keys
    }

    /// Value style
    pub fn style(&self) -> ValueStyle {
        self.style
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::compact()
    }
}

/// Formats [`SensorSample`]s as mesh payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetryEncoder {
    config: TelemetryConfig,
}

impl TelemetryEncoder {
    /// Encoder for a key set
    pub const fn new(config: TelemetryConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Encode into a fresh full-size payload
    pub fn encode(&self, sample: &SensorSample) -> Payload {
        let mut out = Payload::new();
        self.encode_into(sample, &mut out);
        out
    }

    /// Encode into `out`, replacing its contents
    pub fn encode_into<const N: usize>(&self, sample: &SensorSample, out: &mut Payload<N>) {
        out.clear();
        let keys = &self.config.keys;

        let mut writer = ObjectWriter::begin(out, self.config.style);
        writer
            .decimal(keys.temperature, sample.temperature)
            .decimal(keys.humidity, sample.humidity)
            .integer(keys.lux, u32::from(sample.lux))
            .decimal(keys.distance, sample.distance.wire_value());
        writer.finish();

        if out.is_truncated() {
            log_warn!("telemetry truncated to {} bytes: {}", out.len(), out.as_str());
        }
    }

    /// Text looks like one of our telemetry payloads
    pub fn is_telemetry(&self, text: &str) -> bool {
        is_telemetry(text, &self.config)
    }

    /// Parse with this encoder's key set
    pub fn decode(&self, text: &str) -> Option<SensorSample> {
        SensorSample::parse(text, &self.config)
    }
}

/// Bracketed payload naming the temperature and humidity keys of `config`
pub fn is_telemetry(text: &str, config: &TelemetryConfig) -> bool {
    scan::is_bracketed(text)
        && scan::find_quoted_key(text, config.keys.temperature).is_some()
        && scan::find_quoted_key(text, config.keys.humidity).is_some()
}
