//! Loop-Free Command/Feedback Protocol
//!
//! ## Message Kinds
//!
//! The actuator node listens to a broadcast channel that also carries its
//! own feedback, the sensor node's telemetry and anything else other nodes
//! send. Every inbound payload is classified before it can touch state:
//!
//! | Kind        | Test (in order)                                  | Effect            |
//! |-------------|--------------------------------------------------|-------------------|
//! | `Malformed` | not UTF-8                                        | dropped           |
//! | `Unrelated` | not `{...}` after trimming                       | dropped           |
//! | `Feedback`  | contains any feedback key, case-insensitive      | dropped           |
//! | `Command`   | contains any quoted command key                  | applied, feedback |
//! | `Unrelated` | otherwise                                        | dropped           |
//!
//! ## Loop Freedom
//!
//! A feedback payload always names every feedback key, and feedback is
//! checked before commands, so a node that hears its own feedback (or
//! another actuator's) never treats it as a command. Every applied command
//! produces exactly one feedback emission, and feedback produces nothing, so
//! no chain of broadcasts can grow. [`ProtocolConfig::new`] rejects key sets
//! that would break this, such as a command key containing a feedback key.
//!
//! ## Value Scan
//!
//! A command field is `true` when the token `true` appears anywhere between
//! the end of the quoted key and the next `,` or `}`, case-insensitive.
//! `"led1":true`, `"led1":"TRUE"` and `"led1": "true "` all switch the
//! output on; anything else switches it off. The scan never reads past the
//! field, so `{"led1":false,"note":"true"}` leaves `led1` off.

use crate::{
    constants::{
        pins::{LED1_PIN, LED2_PIN},
        protocol::TRUE_TOKEN,
    },
    errors::ConfigError,
    payload::{ObjectWriter, Payload, ValueStyle},
    scan,
    traits::{Gpio, Level, Pin, PinMode},
};

/// What an inbound payload is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Sets one or more outputs
    Command,
    /// Reports output state; never acted on
    Feedback,
    /// Valid text that is neither
    Unrelated,
    /// Not UTF-8 text
    Malformed,
}

/// Inbound payload with its classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundMessage<'a> {
    /// Payload bytes as received
    pub raw: &'a [u8],
    /// Result of [`CommandProtocol::classify`]
    pub kind: Classification,
}

/// One binary output and the keys that address it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputChannel {
    /// Key in command payloads, e.g. `led1`
    pub command_key: &'static str,
    /// Key in feedback payloads, e.g. `feedbackled1`
    pub feedback_key: &'static str,
    /// Output pin
    pub pin: Pin,
}

impl OutputChannel {
    /// Channel from its keys and pin
    pub const fn new(command_key: &'static str, feedback_key: &'static str, pin: Pin) -> Self {
        Self { command_key, feedback_key, pin }
    }
}

/// Reject keys that are empty or would break the surrounding JSON
pub(crate) fn validate_key(key: &'static str) -> Result<(), ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::EmptyKey);
    }
    if key.contains(['"', ',', ':', '{', '}']) {
        return Err(ConfigError::InvalidKey { key });
    }
    Ok(())
}

/// Validated key set for `N` outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig<const N: usize> {
    channels: [OutputChannel; N],
    feedback_style: ValueStyle,
}

impl<const N: usize> ProtocolConfig<N> {
    /// Validate a key set
    ///
    /// Rejects empty keys, keys containing JSON syntax, keys used twice
    /// (case-insensitive, across command and feedback keys) and command keys
    /// that contain a feedback key, since those would classify as feedback.
    pub fn new(channels: [OutputChannel; N], feedback_style: ValueStyle) -> Result<Self, ConfigError> {
        for (i, channel) in channels.iter().enumerate() {
            validate_key(channel.command_key)?;
            validate_key(channel.feedback_key)?;

            if channel.command_key.eq_ignore_ascii_case(channel.feedback_key) {
                return Err(ConfigError::DuplicateKey { key: channel.feedback_key });
            }
            for earlier in &channels[..i] {
                for key in [channel.command_key, channel.feedback_key] {
                    if key.eq_ignore_ascii_case(earlier.command_key)
                        || key.eq_ignore_ascii_case(earlier.feedback_key)
                    {
                        return Err(ConfigError::DuplicateKey { key });
                    }
                }
            }
        }

        for channel in &channels {
            if channels.iter().any(|c| scan::contains_ci(channel.command_key, c.feedback_key)) {
                return Err(ConfigError::AmbiguousKey { key: channel.command_key });
            }
        }

        Ok(Self { channels, feedback_style })
    }

    /// Output channels in feedback order
    pub fn channels(&self) -> &[OutputChannel; N] {
        &self.channels
    }

    /// Value style used for feedback
    pub fn feedback_style(&self) -> ValueStyle {
        self.feedback_style
    }

    /// Switch feedback value style
    pub fn with_feedback_style(mut self, style: ValueStyle) -> Self {
        self.feedback_style = style;
        self
    }
}

impl ProtocolConfig<2> {
    /// `led1`/`led2` on the reference board, bare feedback
    pub const fn two_leds() -> Self {
        Self {
            channels: [
                OutputChannel::new("led1", "feedbackled1", LED1_PIN),
                OutputChannel::new("led2", "feedbackled2", LED2_PIN),
            ],
            feedback_style: ValueStyle::Bare,
        }
    }
}

impl Default for ProtocolConfig<2> {
    fn default() -> Self {
        Self::two_leds()
    }
}

/// Current state of every output, all off at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState<const N: usize> {
    outputs: [bool; N],
}

impl<const N: usize> ActuatorState<N> {
    /// All outputs off
    pub const fn new() -> Self {
        Self { outputs: [false; N] }
    }

    /// State of output `index`
    pub fn output(&self, index: usize) -> Option<bool> {
        self.outputs.get(index).copied()
    }

    /// All outputs
    pub fn outputs(&self) -> &[bool; N] {
        &self.outputs
    }

    fn set(&mut self, index: usize, on: bool) {
        if let Some(slot) = self.outputs.get_mut(index) {
            *slot = on;
        }
    }
}

impl ActuatorState<2> {
    /// First output
    pub fn output1(&self) -> bool {
        self.outputs[0]
    }

    /// Second output
    pub fn output2(&self) -> bool {
        self.outputs[1]
    }
}

impl<const N: usize> Default for ActuatorState<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies inbound payloads and applies commands to the outputs
#[derive(Debug, Clone)]
pub struct CommandProtocol<const N: usize = 2> {
    config: ProtocolConfig<N>,
    state: ActuatorState<N>,
}

impl<const N: usize> CommandProtocol<N> {
    /// Protocol with every output off
    pub const fn new(config: ProtocolConfig<N>) -> Self {
        Self { config, state: ActuatorState::new() }
    }

    /// Key set
    pub fn config(&self) -> &ProtocolConfig<N> {
        &self.config
    }

    /// Output state
    pub fn state(&self) -> &ActuatorState<N> {
        &self.state
    }

    /// Configure output pins and drive them to the current state
    pub fn setup<G: Gpio + ?Sized>(&self, gpio: &mut G) {
        for (channel, &on) in self.config.channels.iter().zip(self.state.outputs.iter()) {
            gpio.set_mode(channel.pin, PinMode::Output);
            gpio.set_output(channel.pin, Level::from(on));
        }
    }

    /// Classify without side effects
    pub fn classify(&self, raw: &[u8]) -> Classification {
        match core::str::from_utf8(raw) {
            Ok(text) => self.classify_text(text),
            Err(_) => Classification::Malformed,
        }
    }

    /// Borrowing wrapper around [`Self::classify`]
    pub fn inbound<'a>(&self, raw: &'a [u8]) -> InboundMessage<'a> {
        InboundMessage { raw, kind: self.classify(raw) }
    }

    fn classify_text(&self, text: &str) -> Classification {
        if !scan::is_bracketed(text) {
            return Classification::Unrelated;
        }
        let channels = &self.config.channels;
        if channels.iter().any(|c| scan::contains_ci(text, c.feedback_key)) {
            return Classification::Feedback;
        }
        if channels.iter().any(|c| scan::find_quoted_key(text, c.command_key).is_some()) {
            return Classification::Command;
        }
        Classification::Unrelated
    }

    /// Classify and, for commands, update the outputs
    ///
    /// Returns the feedback payload to broadcast. `None` for every other
    /// kind of message, which leaves state untouched.
    pub fn classify_and_apply<G: Gpio + ?Sized>(&mut self, raw: &[u8], gpio: &mut G) -> Option<Payload> {
        let message = self.inbound(raw);
        if message.kind != Classification::Command {
            log_debug!("ignoring {:?} payload ({} bytes)", message.kind, raw.len());
            return None;
        }
        let text = core::str::from_utf8(raw).ok()?;

        for (index, channel) in self.config.channels.iter().enumerate() {
            if let Some(on) = scan::flag_value(text, channel.command_key, TRUE_TOKEN) {
                self.state.set(index, on);
                gpio.set_output(channel.pin, Level::from(on));
                log_info!("{} -> {}", channel.command_key, on);
            }
        }

        Some(self.feedback_payload())
    }

    /// Feedback payload describing every output
    pub fn feedback_payload(&self) -> Payload {
        let mut out = Payload::new();
        let mut writer = ObjectWriter::begin(&mut out, self.config.feedback_style);
        for (channel, &on) in self.config.channels.iter().zip(self.state.outputs.iter()) {
            writer.flag(channel.feedback_key, on);
        }
        writer.finish();
        out
    }
}

impl Default for CommandProtocol<2> {
    fn default() -> Self {
        Self::new(ProtocolConfig::two_leds())
    }
}
