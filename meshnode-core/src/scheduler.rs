//! Readiness Gate and Telemetry Timer
//!
//! Nodes do nothing until the mesh stack reports it is ready. The first time
//! it does, the scheduler joins the default broadcast channel, once for the
//! lifetime of the process. After that the sensor node sends telemetry
//! every [`SEND_INTERVAL_MS`].
//!
//! The first send is due as soon as the channel is ready, so a freshly
//! booted node reports immediately instead of after one full interval.
//!
//! Intervals are measured with wrapping subtraction on the millisecond
//! counter, so a counter rollover never stalls sending. Each send is timed
//! from when it actually happened, not from the ideal schedule, so slow
//! ticks make the period drift. That drift is accepted.

use crate::{constants::time::SEND_INTERVAL_MS, time::Timestamp, traits::Transport};

/// Whether the broadcast channel has been joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelReadiness {
    /// Waiting for the transport
    #[default]
    NotReady,
    /// Default channel selected
    Ready,
}

/// What happened during one [`PeriodicScheduler::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerTick {
    /// The default channel was joined on this tick
    pub joined_channel: bool,
    /// A telemetry send is due now
    pub telemetry_due: bool,
}

/// Gates activity on transport readiness and paces telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicScheduler {
    interval_ms: u64,
    readiness: ChannelReadiness,
    last_send: Option<Timestamp>,
}

impl PeriodicScheduler {
    /// Scheduler with a custom interval
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            readiness: ChannelReadiness::NotReady,
            last_send: None,
        }
    }

    /// Send interval in ms
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Current readiness
    pub fn readiness(&self) -> ChannelReadiness {
        self.readiness
    }

    /// `true` once the channel is joined
    pub fn is_ready(&self) -> bool {
        self.readiness == ChannelReadiness::Ready
    }

    /// Time of the last recorded send
    pub fn last_send(&self) -> Option<Timestamp> {
        self.last_send
    }

    /// Join the default channel the first time the transport is ready.
    ///
    /// Returns `true` only on the tick that made the transition.
    pub fn poll_readiness<T: Transport + ?Sized>(&mut self, transport: &mut T) -> bool {
        if self.is_ready() || !transport.is_ready() {
            return false;
        }
        transport.select_default_channel();
        self.readiness = ChannelReadiness::Ready;
        log_info!("transport ready, default channel selected");
        true
    }

    /// `true` if a send is due at `now_ms`; records the send time when it is
    pub fn telemetry_due(&mut self, now_ms: Timestamp) -> bool {
        if !self.is_ready() {
            return false;
        }
        let due = match self.last_send {
            None => true,
            Some(last) => now_ms.wrapping_sub(last) >= self.interval_ms,
        };
        if due {
            self.last_send = Some(now_ms);
        }
        due
    }

    /// Readiness check followed by the interval check
    pub fn tick<T: Transport + ?Sized>(&mut self, transport: &mut T, now_ms: Timestamp) -> SchedulerTick {
        let joined_channel = self.poll_readiness(transport);
        SchedulerTick { joined_channel, telemetry_due: self.telemetry_due(now_ms) }
    }
}

impl Default for PeriodicScheduler {
    fn default() -> Self {
        Self::new(SEND_INTERVAL_MS)
    }
}
