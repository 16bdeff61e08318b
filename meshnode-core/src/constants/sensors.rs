//! Sensor Timing Budgets and Conversion Factors
//!
//! Values for the DHT11 single-wire humidity/temperature sensor and the
//! HC-SR04 class of ultrasonic pulse-echo rangers.

// ===== DHT11 SINGLE-WIRE PROTOCOL =====

/// Host start signal: line held low for at least this long (µs).
///
/// Source: DHT11 datasheet, "at least 18ms"
pub const DHT_START_LOW_US: u32 = 18_000;

/// Host releases the line high for this long before switching to input (µs).
///
/// Source: DHT11 datasheet, 20-40µs
pub const DHT_START_RELEASE_US: u32 = 40;

/// Budget for the sensor to pull the line low after release (µs).
///
/// Measured from the start point, not per wait.
pub const DHT_ACK_TIMEOUT_US: u64 = 80;

/// Budget for the whole frame, measured from the start point (µs).
///
/// A full 40-bit frame takes at most ~5ms, so 10ms leaves room for a slow
/// sensor but a stuck line still terminates the read.
pub const DHT_FRAME_TIMEOUT_US: u64 = 10_000;

/// High pulses longer than this encode a `1` bit (µs).
///
/// Source: DHT11 datasheet, `0` = 26-28µs high, `1` = 70µs high
pub const DHT_BIT_ONE_THRESHOLD_US: u32 = 50;

/// Data bits per frame: 4 data bytes plus checksum.
pub const DHT_FRAME_BITS: usize = 40;

/// Bytes per frame.
pub const DHT_FRAME_BYTES: usize = DHT_FRAME_BITS / 8;

/// Sign bit in the temperature fraction byte (DHT11 rev. 2 sub-zero readings).
pub const DHT_NEGATIVE_FLAG: u8 = 0x80;

// ===== PULSE-ECHO RANGING =====

/// Trigger line settle time before the pulse (µs).
pub const TRIGGER_SETTLE_US: u32 = 2;

/// Trigger pulse width (µs).
///
/// Source: HC-SR04 datasheet, "10uS TTL pulse"
pub const TRIGGER_PULSE_US: u32 = 10;

/// Echo pulse timeout (µs). Around 5m of range.
pub const ECHO_TIMEOUT_US: u64 = 30_000;

/// Speed of sound at ~20°C (cm/µs).
///
/// Halved for round-trip distance.
pub const SOUND_SPEED_CM_PER_US: f32 = 0.034;

// ===== LIGHT =====

/// Full-scale reading of the 12-bit ADC the light sensor sits on.
pub const LUX_ADC_MAX: u16 = 4095;
