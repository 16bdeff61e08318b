//! Payload Budget and Wire-Format Tokens

/// Largest application payload a mesh packet carries (bytes).
///
/// Source: Meshtastic `DATA_PAYLOAD_LEN`
pub const MAX_PAYLOAD_LEN: usize = 233;

/// Wire value used for a distance reading that timed out.
///
/// Negative so it can never be mistaken for a real `0.0` cm reading.
pub const DISTANCE_INVALID_SENTINEL: f32 = -1.0;

/// Literal token the command scan looks for.
pub const TRUE_TOKEN: &str = "true";

/// Literal written for a cleared output.
pub const FALSE_TOKEN: &str = "false";

/// Size of the receive scratch buffer the nodes poll into (bytes).
pub const RX_BUFFER_LEN: usize = MAX_PAYLOAD_LEN;

/// Most inbound payloads the actuator node handles in one tick.
///
/// Anything beyond stays queued for the next tick.
pub const MAX_RX_PER_TICK: usize = 16;
