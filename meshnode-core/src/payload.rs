//! Bounded Mesh Payloads
//!
//! A mesh packet carries at most [`MAX_PAYLOAD_LEN`] bytes of application
//! data. Everything the nodes send is formatted straight into a fixed-size
//! [`Payload`] with `core::fmt`, no heap involved.
//!
//! ## Truncation
//!
//! Formatting never fails and never overruns. Once the buffer is full,
//! further characters are dropped and [`Payload::is_truncated`] reports it.
//! A truncated payload is usually no longer a complete JSON object, so
//! receivers will treat it as unrelated traffic: the reading for that cycle
//! is lost. Callers log the condition; with the default key sets a full
//! telemetry object is well under 100 bytes, so this only bites with
//! unusually long custom keys.
//!
//! Truncation always happens on a character boundary, so [`Payload::as_str`]
//! is valid UTF-8.

use core::fmt;

use heapless::Vec;

use crate::constants::protocol::{FALSE_TOKEN, MAX_PAYLOAD_LEN, TRUE_TOKEN};

/// How scalar values are written into a JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueStyle {
    /// `"temp":25.0`, `"feedbackled1":true`
    #[default]
    Bare,
    /// `"temp":"25.0"`, `"feedbackled1":"true"`
    Quoted,
}

/// Fixed-capacity, truncating text buffer for one mesh packet
#[derive(Clone, PartialEq, Eq)]
pub struct Payload<const N: usize = MAX_PAYLOAD_LEN> {
    bytes: Vec<u8, N>,
    truncated: bool,
}

impl<const N: usize> Payload<N> {
    /// Empty payload
    pub const fn new() -> Self {
        Self { bytes: Vec::new(), truncated: false }
    }

    /// Append as much of `s` as fits. Returns `false` if anything was dropped.
    pub fn push_str(&mut self, s: &str) -> bool {
        if self.truncated {
            return false;
        }
        for c in s.chars() {
            let mut utf8 = [0u8; 4];
            let encoded = c.encode_utf8(&mut utf8).as_bytes();
            if self.bytes.len() + encoded.len() > N {
                self.truncated = true;
                return false;
            }
            // Capacity checked above
            let _ = self.bytes.extend_from_slice(encoded);
        }
        true
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Text view
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes).unwrap_or("")
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// No bytes written
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte budget
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Some output was dropped to stay inside the budget
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Reset to empty
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.truncated = false;
    }
}

impl<const N: usize> Default for Payload<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Write for Payload<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Keep formatting going on overflow so a full buffer never surfaces as an error
        self.push_str(s);
        Ok(())
    }
}

impl<const N: usize> AsRef<[u8]> for Payload<N> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<const N: usize> fmt::Display for Payload<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> fmt::Debug for Payload<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("text", &self.as_str())
            .field("truncated", &self.truncated)
            .finish()
    }
}

/// Writes one flat JSON object field by field
pub(crate) struct ObjectWriter<'a, const N: usize> {
    out: &'a mut Payload<N>,
    style: ValueStyle,
    first: bool,
}

impl<'a, const N: usize> ObjectWriter<'a, N> {
    pub(crate) fn begin(out: &'a mut Payload<N>, style: ValueStyle) -> Self {
        out.push_str("{");
        Self { out, style, first: true }
    }

    fn key(&mut self, key: &str) {
        if !self.first {
            self.out.push_str(",");
        }
        self.first = false;
        self.out.push_str("\"");
        self.out.push_str(key);
        self.out.push_str("\":");
    }

    fn value(&mut self, args: fmt::Arguments<'_>) {
        let quoted = self.style == ValueStyle::Quoted;
        if quoted {
            self.out.push_str("\"");
        }
        let _ = fmt::write(self.out, args);
        if quoted {
            self.out.push_str("\"");
        }
    }

    /// Float with one decimal place
    pub(crate) fn decimal(&mut self, key: &str, value: f32) -> &mut Self {
        self.key(key);
        self.value(format_args!("{:.1}", value));
        self
    }

    pub(crate) fn integer(&mut self, key: &str, value: u32) -> &mut Self {
        self.key(key);
        self.value(format_args!("{}", value));
        self
    }

    pub(crate) fn flag(&mut self, key: &str, value: bool) -> &mut Self {
        self.key(key);
        self.value(format_args!("{}", if value { TRUE_TOKEN } else { FALSE_TOKEN }));
        self
    }

    pub(crate) fn finish(self) {
        self.out.push_str("}");
    }
}
