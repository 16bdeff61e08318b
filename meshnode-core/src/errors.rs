//! Error Types for Sensor Decoding, Transport and Configuration
//!
//! ## Design Philosophy
//!
//! Nodes run unattended with no operator present, so nothing in the core is
//! fatal. Every error here degrades a single cycle:
//!
//! 1. **Small Size**: All variants are a few bytes and `Copy`, cheap to return
//!    from busy-wait loops and to stash as "last error" state.
//!
//! 2. **No Heap Allocation**: No `String` payloads, only plain integers and
//!    `&'static str`.
//!
//! 3. **Actionable**: Each variant tells the caller what to do with the
//!    current cycle (reuse a stale reading, skip a send).
//!
//! ## Error Categories
//!
//! ### Sensor decoding ([`DecodeError`])
//! - `NoResponse`: the sensor never acknowledged the start condition
//! - `Timeout`: a bit slot did not complete inside the frame deadline
//! - `ChecksumMismatch`: the fifth byte disagrees with the sum of the others
//!
//! ### Transport ([`TransportError`])
//! - `NoBuffer`: the radio had no packet buffer to hand out
//! - `NotReady`: the broadcast channel is not joined yet
//!
//! ### Configuration ([`ConfigError`])
//! Raised once at construction time when a key set would break the
//! command/feedback separation.
//!
//! ## Handling Strategy
//!
//! ```rust
//! use meshnode_core::DecodeError;
//!
//! fn on_read(result: Result<f32, DecodeError>, last_good: f32) -> f32 {
//!     match result {
//!         Ok(value) => value,
//!         // Sensor unplugged or busy: keep the stale value for this cycle
//!         Err(DecodeError::NoResponse) => last_good,
//!         // Line noise: next cycle is the only retry
//!         Err(_) => last_good,
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for sensor decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Single-wire decoding failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// No acknowledgement after the start condition
    #[error("sensor did not acknowledge start condition")]
    NoResponse,

    /// Frame deadline passed while waiting on a bit edge
    #[error("timed out waiting for bit edge")]
    Timeout,

    /// Checksum byte does not match the data bytes
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch {
        /// Wrapping sum of the four data bytes
        expected: u8,
        /// Checksum byte sent by the sensor
        actual: u8,
    },
}

/// Broadcast send failures. Callers drop the send, they never retry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No packet buffer available
    #[error("no send buffer available")]
    NoBuffer,

    /// Channel not joined yet
    #[error("transport not ready")]
    NotReady,
}

/// Invalid protocol or telemetry key configuration
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A key is the empty string
    #[error("empty key")]
    EmptyKey,

    /// The same key is used twice
    #[error("duplicate key: {key}")]
    DuplicateKey {
        /// Offending key
        key: &'static str,
    },

    /// A key contains JSON structure characters (`"` `,` `:` `{` `}`)
    #[error("key contains reserved characters: {key}")]
    InvalidKey {
        /// Offending key
        key: &'static str,
    },

    /// A command key would itself be detected as a feedback marker
    #[error("command key {key} contains a feedback marker")]
    AmbiguousKey {
        /// Offending key
        key: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for DecodeError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NoResponse => defmt::write!(fmt, "No response"),
            Self::Timeout => defmt::write!(fmt, "Timeout"),
            Self::ChecksumMismatch { expected, actual } =>
                defmt::write!(fmt, "Checksum {=u8:x} != {=u8:x}", actual, expected),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransportError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NoBuffer => defmt::write!(fmt, "No buffer"),
            Self::NotReady => defmt::write!(fmt, "Not ready"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::EmptyKey => defmt::write!(fmt, "Empty key"),
            Self::DuplicateKey { key } => defmt::write!(fmt, "Duplicate key {}", key),
            Self::InvalidKey { key } => defmt::write!(fmt, "Invalid key {}", key),
            Self::AmbiguousKey { key } => defmt::write!(fmt, "Ambiguous key {}", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_stay_small() {
        assert!(core::mem::size_of::<DecodeError>() <= 4);
        assert!(core::mem::size_of::<TransportError>() <= 1);
    }

    #[cfg(feature = "std")]
    #[test]
    fn checksum_message_shows_both_bytes() {
        let err = DecodeError::ChecksumMismatch { expected: 0x3c, actual: 0x3d };
        assert_eq!(err.to_string(), "checksum mismatch: expected 0x3c, got 0x3d");
    }
}
