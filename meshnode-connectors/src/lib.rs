//! Gateway-Side Connectors for meshnode
//!
//! ## Overview
//!
//! The nodes themselves only talk to the mesh. Everything that happens on
//! the Linux gateway attached to a radio lives here:
//!
//! - [`jsonl`]: append every received message to a JSON Lines file, read
//!   the file back and pull telemetry out of it
//! - [`loopback`]: an in-process broadcast medium implementing the core
//!   [`Transport`](meshnode_core::Transport) trait, for running several
//!   nodes against each other on a host
//!
//! ## Log Format
//!
//! One JSON object per line, written as soon as the message arrives:
//!
//! ```text
//! {"time":"2025-03-14T09:26:53","from":"!a1b2c3d4","to":"^all","portnum":"TEXT_MESSAGE_APP","message":"{\"temp\":23.4,\"hum\":45.0,\"lux\":1234,\"dist\":17.0}"}
//! ```
//!
//! The format is line-oriented so a crashed gateway loses at most the line
//! being written, and so the file can be bulk-imported into a database.
//!
//! ## Example Usage
//!
//! ```no_run
//! use meshnode_connectors::{jsonl::JsonLinesLogger, Connector};
//!
//! let mut log = JsonLinesLogger::open("/home/pi/meshtastic/messages.jsonl")?;
//! log.send("!a1b2c3d4", b"{\"led1\":true}")?;
//! assert!(log.is_connected());
//! # Ok::<(), meshnode_connectors::ConnectorError>(())
//! ```

pub mod jsonl;
pub mod loopback;

pub use jsonl::{read_records, JsonLinesLogger, MessageRecord, TelemetryRecord};
pub use loopback::{LoopbackMesh, LoopbackPort};

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Underlying file or device failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized or parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A log line is not a valid record
    #[error("bad record on line {line}: {source}")]
    BadRecord {
        /// 1-based line number
        line: usize,
        /// Parse failure
        source: serde_json::Error,
    },

    /// Connector was closed
    #[error("Not connected")]
    NotConnected,
}

/// Sink for messages leaving the mesh
pub trait Connector {
    /// Error type
    type Error;

    /// Forward one message. `topic` identifies the sender.
    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// `true` while messages can be forwarded
    fn is_connected(&self) -> bool;
}

/// Counters common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Messages forwarded
    pub messages_sent: u64,
    /// Messages that failed
    pub messages_failed: u64,
    /// Bytes written
    pub bytes_sent: u64,
    /// Last failure
    pub last_error: Option<String>,
}
