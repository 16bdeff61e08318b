//! Constants for meshnode Core
//!
//! Centralised numeric values for sensor timing, scheduling and the mesh
//! payload budget. Every value carries its unit in the name and, where it
//! comes from a datasheet or the radio firmware, a note on its source.
//!
//! ## Organization
//!
//! - **Sensors**: single-wire and pulse-echo timing budgets
//! - **Time**: scheduling intervals
//! - **Protocol**: payload size and wire-format tokens
//! - **Pins**: default pin map of the reference boards

/// Single-wire and pulse-echo sensor timing and conversion factors.
pub mod sensors;

/// Scheduling intervals.
pub mod time;

/// Payload budget and wire-format tokens.
pub mod protocol;

/// Default pin assignments of the reference sensor and actuator boards.
pub mod pins;

pub use sensors::{
    DHT_ACK_TIMEOUT_US, DHT_BIT_ONE_THRESHOLD_US, DHT_FRAME_BITS, DHT_FRAME_TIMEOUT_US,
    ECHO_TIMEOUT_US, SOUND_SPEED_CM_PER_US,
};

pub use time::{INDICATOR_PULSE_MS, SEND_INTERVAL_MS};

pub use protocol::{DISTANCE_INVALID_SENTINEL, MAX_PAYLOAD_LEN};
