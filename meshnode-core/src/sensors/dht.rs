//! DHT11 Single-Wire Humidity/Temperature Decoder
//!
//! ## Protocol
//!
//! One open-drain data line carries both the host's start request and the
//! sensor's self-clocked reply. There is no clock line, so every bit is
//! recovered from edge timing alone:
//!
//! ```text
//! host start        ack          bit 0          bit 1
//! ‾‾\_________/‾‾‾\____/‾‾‾‾\_____/‾‾\_____/‾‾‾‾‾‾‾\__ ...
//!    ≥18ms    40µs  80µs  80µs  50µs  26µs 50µs  70µs
//! ```
//!
//! 1. Host drives low for ≥18ms, high for 40µs, then releases the line
//! 2. Sensor acknowledges with ~80µs low then ~80µs high
//! 3. Sensor sends 40 bits, each a ~50µs low preamble then a high pulse
//!    whose width encodes the bit (>50µs = `1`)
//! 4. Bits are packed MSB first into five bytes:
//!    humidity integer, humidity fraction, temperature integer,
//!    temperature fraction, checksum
//!
//! ## Shared Deadline
//!
//! Every wait after release is measured from the same start point: 80µs for
//! the sensor to pull the line low, 10ms for everything else. A slow first
//! bit therefore shortens the budget of all later bits. The deadline is a
//! plain [`Deadline`] value passed into each wait.
//!
//! ## Checksum
//!
//! The fifth byte is the wrapping sum of the first four. It is enforced by
//! default; [`ChecksumPolicy::Ignore`] reproduces firmware that skipped the
//! check and trusted whatever arrived.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meshnode_core::sensors::{Dht11, ChecksumPolicy};
//!
//! let dht = Dht11::new(6).with_checksum(ChecksumPolicy::Enforce);
//! dht.begin(&mut gpio);
//! match dht.read(&mut gpio, &clock) {
//!     Ok(r) => println!("{}% {}°C", r.humidity, r.temperature),
//!     Err(e) => println!("read failed: {}", e),
//! }
//! ```

use crate::{
    constants::sensors::{
        DHT_ACK_TIMEOUT_US, DHT_BIT_ONE_THRESHOLD_US, DHT_FRAME_BITS, DHT_FRAME_BYTES,
        DHT_FRAME_TIMEOUT_US, DHT_NEGATIVE_FLAG, DHT_START_LOW_US, DHT_START_RELEASE_US,
    },
    errors::{DecodeError, DecodeResult},
    time::Deadline,
    traits::{Clock, Gpio, Level, Pin, PinMode},
};

use super::wait_while;

/// What to do with the checksum byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChecksumPolicy {
    /// Reject frames whose checksum does not match
    #[default]
    Enforce,
    /// Accept every frame
    Ignore,
}

/// How the fraction bytes are used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Precision {
    /// Integer byte plus fraction byte as tenths
    #[default]
    Tenths,
    /// Integer bytes only
    Integer,
}

/// Decoded humidity (%RH) and temperature (°C)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DhtReading {
    /// Relative humidity in percent
    pub humidity: f32,
    /// Temperature in °C
    pub temperature: f32,
}

/// High-pulse widths of one frame, in µs. Lives only for the duration of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTrain {
    widths_us: [u32; DHT_FRAME_BITS],
}

impl PulseTrain {
    /// Wrap raw pulse widths
    pub const fn new(widths_us: [u32; DHT_FRAME_BITS]) -> Self {
        Self { widths_us }
    }

    /// Raw widths
    pub fn widths(&self) -> &[u32; DHT_FRAME_BITS] {
        &self.widths_us
    }

    /// Classify each pulse and pack MSB first
    pub fn to_frame(&self) -> Frame {
        let mut bytes = [0u8; DHT_FRAME_BYTES];
        for (i, &width) in self.widths_us.iter().enumerate() {
            if width > DHT_BIT_ONE_THRESHOLD_US {
                bytes[i / 8] |= 1 << (7 - (i % 8));
            }
        }
        Frame::new(bytes)
    }
}

/// Five decoded bytes of a DHT11 frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; DHT_FRAME_BYTES],
}

impl Frame {
    /// Wrap raw frame bytes
    pub const fn new(bytes: [u8; DHT_FRAME_BYTES]) -> Self {
        Self { bytes }
    }

    /// Raw bytes
    pub fn bytes(&self) -> &[u8; DHT_FRAME_BYTES] {
        &self.bytes
    }

    /// Wrapping sum of the four data bytes
    pub fn expected_checksum(&self) -> u8 {
        self.bytes[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
    }

    /// Checksum byte as sent
    pub fn checksum(&self) -> u8 {
        self.bytes[4]
    }

    /// `Err(ChecksumMismatch)` if the checksum byte is wrong
    pub fn verify(&self) -> DecodeResult<()> {
        let expected = self.expected_checksum();
        if expected != self.checksum() {
            return Err(DecodeError::ChecksumMismatch { expected, actual: self.checksum() });
        }
        Ok(())
    }

    /// Relative humidity in percent
    pub fn humidity(&self, precision: Precision) -> f32 {
        let [int, frac, ..] = self.bytes;
        match precision {
            Precision::Tenths => int as f32 + frac as f32 / 10.0,
            Precision::Integer => int as f32,
        }
    }

    /// Temperature in °C
    pub fn temperature(&self, precision: Precision) -> f32 {
        let [_, _, int, frac, _] = self.bytes;
        let magnitude = match precision {
            Precision::Tenths => int as f32 + (frac & !DHT_NEGATIVE_FLAG) as f32 / 10.0,
            Precision::Integer => int as f32,
        };
        if frac & DHT_NEGATIVE_FLAG != 0 { -magnitude } else { magnitude }
    }

    /// Both values at the given precision
    pub fn reading(&self, precision: Precision) -> DhtReading {
        DhtReading {
            humidity: self.humidity(precision),
            temperature: self.temperature(precision),
        }
    }
}

/// DHT11 on one GPIO pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dht11 {
    pin: Pin,
    checksum: ChecksumPolicy,
    precision: Precision,
}

impl Dht11 {
    /// Sensor on `pin` with checksum enforcement and tenths precision
    pub const fn new(pin: Pin) -> Self {
        Self {
            pin,
            checksum: ChecksumPolicy::Enforce,
            precision: Precision::Tenths,
        }
    }

    /// Set the checksum policy
    pub const fn with_checksum(mut self, checksum: ChecksumPolicy) -> Self {
        self.checksum = checksum;
        self
    }

    /// Set the precision
    pub const fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Data pin
    pub const fn pin(&self) -> Pin {
        self.pin
    }

    /// Idle the line high through the pull-up
    pub fn begin<G: Gpio + ?Sized>(&self, gpio: &mut G) {
        gpio.set_mode(self.pin, PinMode::InputPullup);
    }

    /// Run one full read: start condition, capture, decode, checksum
    pub fn read<G, C>(&self, gpio: &mut G, clock: &C) -> DecodeResult<DhtReading>
    where
        G: Gpio + ?Sized,
        C: Clock + ?Sized,
    {
        let frame = self.capture(gpio, clock)?.to_frame();

        if self.checksum == ChecksumPolicy::Enforce {
            frame.verify()?;
        }

        Ok(frame.reading(self.precision))
    }

    /// Issue the start condition and time the 40 data pulses
    pub fn capture<G, C>(&self, gpio: &mut G, clock: &C) -> DecodeResult<PulseTrain>
    where
        G: Gpio + ?Sized,
        C: Clock + ?Sized,
    {
        self.start_signal(gpio, clock);

        let frame = Deadline::from_now_us(clock, DHT_FRAME_TIMEOUT_US);
        let ack = frame.with_budget(DHT_ACK_TIMEOUT_US);
        let pin = self.pin;

        // Sensor pulls the line low to acknowledge, then holds ~80µs low and ~80µs high
        wait_while(gpio, clock, pin, Level::High, ack).map_err(|_| DecodeError::NoResponse)?;
        wait_while(gpio, clock, pin, Level::Low, frame).map_err(|_| DecodeError::NoResponse)?;
        wait_while(gpio, clock, pin, Level::High, frame).map_err(|_| DecodeError::NoResponse)?;

        let mut widths = [0u32; DHT_FRAME_BITS];
        for width in widths.iter_mut() {
            wait_while(gpio, clock, pin, Level::Low, frame).map_err(|_| DecodeError::Timeout)?;
            let rise = clock.micros();
            wait_while(gpio, clock, pin, Level::High, frame).map_err(|_| DecodeError::Timeout)?;
            *width = clock.micros().wrapping_sub(rise) as u32;
        }

        Ok(PulseTrain::new(widths))
    }

    fn start_signal<G, C>(&self, gpio: &mut G, clock: &C)
    where
        G: Gpio + ?Sized,
        C: Clock + ?Sized,
    {
        gpio.set_mode(self.pin, PinMode::Output);
        gpio.set_output(self.pin, Level::Low);
        clock.delay_us(DHT_START_LOW_US);
        gpio.set_output(self.pin, Level::High);
        clock.delay_us(DHT_START_RELEASE_US);
        gpio.set_mode(self.pin, PinMode::InputPullup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train_for(bytes: [u8; 5]) -> PulseTrain {
        let mut widths = [0u32; DHT_FRAME_BITS];
        for (i, width) in widths.iter_mut().enumerate() {
            let bit = bytes[i / 8] >> (7 - (i % 8)) & 1;
            *width = if bit == 1 { 70 } else { 26 };
        }
        PulseTrain::new(widths)
    }

    #[test]
    fn pulses_pack_msb_first() {
        let frame = train_for([0x2d, 0x00, 0x17, 0x04, 0x48]).to_frame();
        assert_eq!(frame.bytes(), &[0x2d, 0x00, 0x17, 0x04, 0x48]);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut widths = [0u32; DHT_FRAME_BITS];
        widths[0] = DHT_BIT_ONE_THRESHOLD_US;
        widths[1] = DHT_BIT_ONE_THRESHOLD_US + 1;
        let frame = PulseTrain::new(widths).to_frame();
        assert_eq!(frame.bytes()[0], 0b0100_0000);
    }

    #[test]
    fn checksum_wraps() {
        let frame = Frame::new([200, 50, 10, 0, 4]);
        assert_eq!(frame.expected_checksum(), 4);
        assert!(frame.verify().is_ok());
    }

    #[test]
    fn checksum_mismatch_reports_both_bytes() {
        let frame = Frame::new([45, 0, 23, 4, 0x49]);
        assert_eq!(
            frame.verify(),
            Err(DecodeError::ChecksumMismatch { expected: 0x48, actual: 0x49 })
        );
    }

    #[test]
    fn tenths_and_integer_precision() {
        let frame = Frame::new([45, 3, 23, 4, 75]);
        let tenths = frame.reading(Precision::Tenths);
        assert!((tenths.humidity - 45.3).abs() < 1e-4);
        assert!((tenths.temperature - 23.4).abs() < 1e-4);

        let integer = frame.reading(Precision::Integer);
        assert_eq!(integer.humidity, 45.0);
        assert_eq!(integer.temperature, 23.0);
    }

    #[test]
    fn negative_temperature_flag() {
        let frame = Frame::new([80, 0, 2, 0x85, 0]);
        assert!((frame.temperature(Precision::Tenths) + 2.5).abs() < 1e-4);
        assert_eq!(frame.temperature(Precision::Integer), -2.0);
    }

    #[test]
    fn builder_sets_policy() {
        let dht = Dht11::new(6)
            .with_checksum(ChecksumPolicy::Ignore)
            .with_precision(Precision::Integer);
        assert_eq!(dht.pin(), 6);
        assert_eq!(dht.checksum, ChecksumPolicy::Ignore);
        assert_eq!(dht.precision, Precision::Integer);
    }
}
