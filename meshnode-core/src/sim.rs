//! Deterministic Hardware Simulation (requires std)
//!
//! Test doubles for the [`Clock`], [`Gpio`], [`AnalogInput`] and
//! [`Transport`] seams, for host-side tests and demos of the node loops.
//!
//! ## Virtual time
//!
//! [`SimClock`] never looks at the wall clock. Every `micros()` call
//! advances it by 1µs and delays advance it by their length, so the
//! busy-wait loops in the sensor drivers make progress and time out at
//! exactly the same point on every run.
//!
//! ## Scripted inputs
//!
//! A [`Waveform`] is a list of `(level, duration)` segments played back on
//! an input pin. Scripts start when their [`Trigger`] fires:
//!
//! - [`Trigger::InputMode`]: the pin is switched to an input mode, which is
//!   how the DHT11 driver releases the line after its start condition
//! - [`Trigger::FallingEdge`]: another pin is driven from high to low, which
//!   is the end of the ranger's trigger pulse
//!
//! Each trigger restarts the script, so the same waveform answers every read.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{
    constants::sensors::DHT_FRAME_BITS,
    errors::TransportError,
    traits::{AnalogInput, Clock, Gpio, Level, Pin, PinMode, Transport},
};

/// Virtual microsecond clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_us: Arc<AtomicU64>,
}

impl SimClock {
    /// Clock at `start_us`
    pub fn new(start_us: u64) -> Self {
        Self { now_us: Arc::new(AtomicU64::new(start_us)) }
    }

    /// Current time without advancing
    pub fn now_us(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst)
    }

    /// Move time forward
    pub fn advance_us(&self, us: u64) {
        self.now_us.fetch_add(us, Ordering::SeqCst);
    }

    /// Move time forward in milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms * 1000);
    }
}

impl Clock for SimClock {
    fn micros(&self) -> u64 {
        self.now_us.fetch_add(1, Ordering::SeqCst)
    }

    fn millis(&self) -> u64 {
        self.now_us() / 1000
    }

    fn delay_us(&self, us: u32) {
        self.advance_us(u64::from(us));
    }

    fn delay_ms(&self, ms: u32) {
        self.advance_ms(u64::from(ms));
    }
}

/// Level sequence played back on an input pin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    segments: Vec<(Level, u64)>,
    after: Level,
}

impl Waveform {
    /// Empty waveform that settles at `after`
    pub fn new(after: Level) -> Self {
        Self { segments: Vec::new(), after }
    }

    /// Append a segment
    pub fn then(mut self, level: Level, duration_us: u64) -> Self {
        self.segments.push((level, duration_us));
        self
    }

    /// Total scripted duration
    pub fn duration_us(&self) -> u64 {
        self.segments.iter().map(|(_, d)| d).sum()
    }

    /// Level `elapsed_us` after the script started
    pub fn level_at(&self, elapsed_us: u64) -> Level {
        let mut end = 0;
        for &(level, duration) in &self.segments {
            end += duration;
            if elapsed_us < end {
                return level;
            }
        }
        self.after
    }
}

/// Builds the line activity of a DHT11 answering one read
#[derive(Debug, Clone, Copy)]
pub struct DhtWaveform {
    bytes: [u8; 5],
    response_delay_us: u64,
    preamble_us: u64,
    first_preamble_us: u64,
    zero_us: u64,
    one_us: u64,
}

impl DhtWaveform {
    /// Nominal datasheet timings for `bytes`
    pub fn new(bytes: [u8; 5]) -> Self {
        Self {
            bytes,
            response_delay_us: 30,
            preamble_us: 50,
            first_preamble_us: 50,
            zero_us: 26,
            one_us: 70,
        }
    }

    /// Frame with a correct checksum for the given values
    pub fn from_values(hum_int: u8, hum_frac: u8, temp_int: u8, temp_frac: u8) -> Self {
        let sum = hum_int.wrapping_add(hum_frac).wrapping_add(temp_int).wrapping_add(temp_frac);
        Self::new([hum_int, hum_frac, temp_int, temp_frac, sum])
    }

    /// Time between release and the sensor pulling low
    pub fn with_response_delay_us(mut self, us: u64) -> Self {
        self.response_delay_us = us;
        self
    }

    /// Low preamble before the first data bit
    pub fn with_first_preamble_us(mut self, us: u64) -> Self {
        self.first_preamble_us = us;
        self
    }

    /// Waveform starting at line release
    pub fn build(&self) -> Waveform {
        let mut wave = Waveform::new(Level::High)
            .then(Level::High, self.response_delay_us)
            .then(Level::Low, 80)
            .then(Level::High, 80);
        for i in 0..DHT_FRAME_BITS {
            let bit = self.bytes[i / 8] >> (7 - (i % 8)) & 1;
            let preamble = if i == 0 { self.first_preamble_us } else { self.preamble_us };
            let high = if bit == 1 { self.one_us } else { self.zero_us };
            wave = wave.then(Level::Low, preamble).then(Level::High, high);
        }
        wave.then(Level::Low, self.preamble_us)
    }
}

/// Echo pulse of `width_us`, rising `delay_us` after the trigger pulse ends
pub fn echo_waveform(delay_us: u64, width_us: u64) -> Waveform {
    Waveform::new(Level::Low).then(Level::Low, delay_us).then(Level::High, width_us)
}

/// When a pin script starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The scripted pin is switched to an input mode
    InputMode,
    /// The given pin goes from high to low
    FallingEdge(Pin),
}

#[derive(Debug, Clone)]
struct Script {
    wave: Waveform,
    trigger: Trigger,
    started_at: Option<u64>,
}

/// Simulated GPIO bank
#[derive(Debug, Clone)]
pub struct SimGpio {
    clock: SimClock,
    modes: HashMap<Pin, PinMode>,
    outputs: HashMap<Pin, Level>,
    analog: HashMap<Pin, u16>,
    scripts: HashMap<Pin, Script>,
    writes: Vec<(u64, Pin, Level)>,
}

impl SimGpio {
    /// GPIO bank timed by `clock`
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            modes: HashMap::new(),
            outputs: HashMap::new(),
            analog: HashMap::new(),
            scripts: HashMap::new(),
            writes: Vec::new(),
        }
    }

    /// Play `wave` on `pin` every time `trigger` fires
    pub fn script(&mut self, pin: Pin, wave: Waveform, trigger: Trigger) {
        self.scripts.insert(pin, Script { wave, trigger, started_at: None });
    }

    /// Remove a pin's script
    pub fn clear_script(&mut self, pin: Pin) {
        self.scripts.remove(&pin);
    }

    /// Fixed analog reading
    pub fn set_analog(&mut self, pin: Pin, value: u16) {
        self.analog.insert(pin, value);
    }

    /// Last driven output level
    pub fn output(&self, pin: Pin) -> Option<Level> {
        self.outputs.get(&pin).copied()
    }

    /// Configured mode
    pub fn mode(&self, pin: Pin) -> Option<PinMode> {
        self.modes.get(&pin).copied()
    }

    /// Every `set_output` as `(time_us, pin, level)`
    pub fn writes(&self) -> &[(u64, Pin, Level)] {
        &self.writes
    }

    /// Writes to one pin
    pub fn writes_to(&self, pin: Pin) -> impl Iterator<Item = (u64, Level)> + '_ {
        self.writes.iter().filter(move |w| w.1 == pin).map(|w| (w.0, w.2))
    }

    fn fire(&mut self, matches: impl Fn(Pin, Trigger) -> bool) {
        let now = self.clock.now_us();
        for (&pin, script) in self.scripts.iter_mut() {
            if matches(pin, script.trigger) {
                script.started_at = Some(now);
            }
        }
    }
}

impl Gpio for SimGpio {
    fn set_mode(&mut self, pin: Pin, mode: PinMode) {
        self.modes.insert(pin, mode);
        if mode != PinMode::Output {
            self.fire(|scripted, trigger| scripted == pin && trigger == Trigger::InputMode);
        }
    }

    fn set_output(&mut self, pin: Pin, level: Level) {
        let previous = self.outputs.insert(pin, level);
        self.writes.push((self.clock.now_us(), pin, level));
        if previous == Some(Level::High) && level == Level::Low {
            self.fire(|_, trigger| trigger == Trigger::FallingEdge(pin));
        }
    }

    fn read_input(&mut self, pin: Pin) -> Level {
        if let Some(Script { wave, started_at: Some(start), .. }) = self.scripts.get(&pin) {
            return wave.level_at(self.clock.now_us().saturating_sub(*start));
        }
        match self.modes.get(&pin) {
            Some(PinMode::InputPullup) => Level::High,
            Some(PinMode::Output) => self.outputs.get(&pin).copied().unwrap_or(Level::Low),
            _ => Level::Low,
        }
    }
}

impl AnalogInput for SimGpio {
    fn read_analog(&mut self, pin: Pin) -> u16 {
        self.analog.get(&pin).copied().unwrap_or(0)
    }
}

/// In-memory transport for one node
///
/// With `hear_own` set, every broadcast is also queued on the node's own
/// inbox, as happens on a real broadcast channel.
#[derive(Debug, Clone, Default)]
pub struct SimTransport {
    /// Reported by `is_ready`
    pub ready: bool,
    /// Queue own broadcasts for `receive`
    pub hear_own: bool,
    /// Error returned by the next broadcast instead of sending
    pub fail_next: Option<TransportError>,
    /// Number of `select_default_channel` calls
    pub channel_joins: u32,
    /// Payloads accepted for broadcast
    pub sent: Vec<Vec<u8>>,
    /// Payloads waiting for `receive`
    pub inbox: VecDeque<Vec<u8>>,
}

impl SimTransport {
    /// Transport that is already ready
    pub fn ready() -> Self {
        Self { ready: true, ..Default::default() }
    }

    /// Queue an inbound payload
    pub fn deliver(&mut self, payload: &[u8]) {
        self.inbox.push_back(payload.to_vec());
    }

    /// Sent payloads as text
    pub fn sent_text(&self) -> Vec<String> {
        self.sent.iter().map(|p| String::from_utf8_lossy(p).into_owned()).collect()
    }
}

impl Transport for SimTransport {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn select_default_channel(&mut self) {
        self.channel_joins += 1;
    }

    fn broadcast(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if let Some(e) = self.fail_next.take() {
            return Err(e);
        }
        self.sent.push(payload.to_vec());
        if self.hear_own {
            self.inbox.push_back(payload.to_vec());
        }
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Option<usize> {
        let payload = self.inbox.pop_front()?;
        let len = payload.len().min(buf.len());
        buf[..len].copy_from_slice(&payload[..len]);
        Some(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_advances_per_read() {
        let clock = SimClock::new(100);
        assert_eq!(clock.micros(), 100);
        assert_eq!(clock.micros(), 101);
        clock.delay_ms(2);
        assert_eq!(clock.now_us(), 2102);
        assert_eq!(clock.millis(), 2);
    }

    #[test]
    fn waveform_levels() {
        let wave = echo_waveform(10, 100);
        assert_eq!(wave.level_at(0), Level::Low);
        assert_eq!(wave.level_at(10), Level::High);
        assert_eq!(wave.level_at(109), Level::High);
        assert_eq!(wave.level_at(110), Level::Low);
        assert_eq!(wave.duration_us(), 110);
    }

    #[test]
    fn falling_edge_starts_script() {
        let clock = SimClock::new(0);
        let mut gpio = SimGpio::new(clock.clone());
        gpio.script(4, echo_waveform(0, 50), Trigger::FallingEdge(5));

        assert_eq!(gpio.read_input(4), Level::Low);
        gpio.set_output(5, Level::High);
        gpio.set_output(5, Level::Low);
        assert_eq!(gpio.read_input(4), Level::High);
        clock.advance_us(50);
        assert_eq!(gpio.read_input(4), Level::Low);
    }

    #[test]
    fn pullup_idles_high() {
        let mut gpio = SimGpio::new(SimClock::default());
        gpio.set_mode(6, PinMode::InputPullup);
        assert_eq!(gpio.read_input(6), Level::High);
    }

    #[test]
    fn transport_hears_itself() {
        let mut transport = SimTransport { hear_own: true, ..SimTransport::ready() };
        transport.broadcast(b"{}").unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(transport.receive(&mut buf), Some(2));
        assert_eq!(&buf[..2], b"{}");
        assert_eq!(transport.receive(&mut buf), None);
    }
}
