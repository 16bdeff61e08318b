//! Broadcast Transport Abstraction
//!
//! The mesh stack (routing, node identity, channel keys, packet allocation)
//! lives outside this crate. The core only needs to know whether the
//! channel is usable, join it once, hand over a payload for best-effort
//! broadcast, and poll for inbound payloads.
//!
//! ## Delivery Model
//!
//! - **Broadcast only**: every node on the channel may receive a payload,
//!   including the sender itself
//! - **Unacknowledged**: a successful `broadcast` only means the radio
//!   accepted the bytes
//! - **Unordered, lossy, duplicating**: the core must tolerate all three
//!
//! Loop prevention for self-received payloads is entirely the core's job
//! (see [`crate::protocol`]), never the transport's.

use crate::errors::TransportError;

/// Mesh broadcast channel
pub trait Transport {
    /// `true` once the node has an identity and a usable send queue
    fn is_ready(&self) -> bool;

    /// Join the default broadcast channel. Called once per process lifetime.
    fn select_default_channel(&mut self);

    /// Best-effort broadcast of one payload
    fn broadcast(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Poll for one inbound payload, copying it into `buf`.
    ///
    /// Returns the payload length, or `None` when nothing is waiting.
    /// Callback-driven stacks leave this at the default and call
    /// `handle_incoming` on the node directly.
    fn receive(&mut self, _buf: &mut [u8]) -> Option<usize> {
        None
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn select_default_channel(&mut self) {
        (**self).select_default_channel()
    }

    fn broadcast(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        (**self).broadcast(payload)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Option<usize> {
        (**self).receive(buf)
    }
}
