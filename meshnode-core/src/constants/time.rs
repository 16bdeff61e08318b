//! Time-Related Constants
//!
//! Scheduling intervals used by the nodes.

// ===== SCHEDULING =====

/// Telemetry interval of the sensor node (milliseconds).
///
/// Long enough to stay well inside LoRa duty-cycle limits on a shared
/// channel, short enough for aquaponics trend graphs.
pub const SEND_INTERVAL_MS: u64 = 30_000;

/// How long the actuator node's indicator stays lit for received telemetry
/// (milliseconds).
pub const INDICATOR_PULSE_MS: u64 = 250;
