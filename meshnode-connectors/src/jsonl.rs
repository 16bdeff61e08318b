//! JSON Lines Message Log
//!
//! The gateway keeps every message it hears in an append-only file, one
//! [`MessageRecord`] per line. Telemetry is pulled out afterwards with
//! [`MessageRecord::telemetry`], which parses strictly with `serde_json`
//! rather than with the lenient on-node scanner.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use meshnode_core::{Distance, SensorSample, TelemetryConfig};

use crate::{ConnectionStats, Connector, ConnectorError};

/// Destination of a channel-wide broadcast
pub const BROADCAST_ADDR: &str = "^all";

/// Port number name of plain text payloads
pub const TEXT_PORTNUM: &str = "TEXT_MESSAGE_APP";

/// One received message as logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Local receive time, ISO 8601 to the second
    pub time: String,
    /// Sender node id
    pub from: Option<String>,
    /// Destination node id
    pub to: Option<String>,
    /// Application port name
    pub portnum: Option<String>,
    /// Payload text, `None` for non-text packets
    pub message: Option<String>,
}

impl MessageRecord {
    /// Text message received now. Invalid UTF-8 is replaced, not rejected.
    pub fn text(from: &str, to: &str, payload: &[u8]) -> Self {
        Self {
            time: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            from: Some(from.to_owned()),
            to: Some(to.to_owned()),
            portnum: Some(TEXT_PORTNUM.to_owned()),
            message: Some(String::from_utf8_lossy(payload).into_owned()),
        }
    }

    /// Telemetry carried by this message, if it is a complete telemetry object
    ///
    /// Values may be JSON numbers or numeric strings, matching both sensor
    /// firmware generations.
    pub fn telemetry(&self, config: &TelemetryConfig) -> Option<TelemetryRecord> {
        let text = self.message.as_deref()?;
        let value: Value = serde_json::from_str(text).ok()?;
        let object = value.as_object()?;
        let keys = config.keys();

        let number = |key: &str| -> Option<f64> {
            match object.get(key)? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
        };

        let lux = number(keys.lux)?;
        let sample = SensorSample {
            temperature: number(keys.temperature)? as f32,
            humidity: number(keys.humidity)? as f32,
            lux: lux.round().clamp(0.0, f64::from(u16::MAX)) as u16,
            distance: Distance::from_wire(number(keys.distance)? as f32),
        };

        Some(TelemetryRecord { time: self.time.clone(), from: self.from.clone(), sample })
    }
}

/// Telemetry extracted from a logged message
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// Receive time
    pub time: String,
    /// Sensor node id
    pub from: Option<String>,
    /// Decoded readings
    pub sample: SensorSample,
}

/// Appends [`MessageRecord`]s to a JSON Lines file
#[derive(Debug)]
pub struct JsonLinesLogger {
    path: PathBuf,
    file: Option<File>,
    stats: ConnectionStats,
}

impl JsonLinesLogger {
    /// Open `path` for appending, creating it and its parent directories
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConnectorError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("logging messages to {}", path.display());
        Ok(Self { path, file: Some(file), stats: ConnectionStats::default() })
    }

    /// Log file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counters since open
    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Append one record
    pub fn log(&mut self, record: &MessageRecord) -> Result<(), ConnectorError> {
        let result = self.write_line(record);
        match &result {
            Ok(bytes) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += *bytes as u64;
                info!("saved message: {}", record.message.as_deref().unwrap_or("(non-text packet)"));
            }
            Err(e) => {
                self.stats.messages_failed += 1;
                self.stats.last_error = Some(e.to_string());
                warn!("failed to write to {}: {}", self.path.display(), e);
            }
        }
        result.map(|_| ())
    }

    fn write_line(&mut self, record: &MessageRecord) -> Result<usize, ConnectorError> {
        let file = self.file.as_mut().ok_or(ConnectorError::NotConnected)?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(line.len())
    }

    /// Stop logging; later sends fail with [`ConnectorError::NotConnected`]
    pub fn close(&mut self) {
        self.file = None;
    }
}

impl Connector for JsonLinesLogger {
    type Error = ConnectorError;

    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error> {
        self.log(&MessageRecord::text(topic, BROADCAST_ADDR, data))
    }

    fn is_connected(&self) -> bool {
        self.file.is_some()
    }
}

/// Read a log back. Blank lines are skipped.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<MessageRecord>, ConnectorError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|source| ConnectorError::BadRecord { line: index + 1, source })?;
        records.push(record);
    }
    Ok(records)
}
