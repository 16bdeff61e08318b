//! In-Process Broadcast Mesh
//!
//! Stands in for the radio when running several nodes on one host. Every
//! broadcast is queued on every port's inbox, including the sender's own,
//! which is exactly the echo the command protocol has to survive.
//!
//! Ports share state through an `Arc<Mutex<_>>`, so nodes may run on
//! separate threads. Each port can be switched between ready and not ready
//! to simulate a radio that is still booting or has lost its channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use meshnode_core::{Transport, TransportError};

#[derive(Debug)]
struct PortState {
    id: String,
    ready: bool,
    channel_joins: u32,
    inbox: VecDeque<Vec<u8>>,
}

#[derive(Debug, Default)]
struct MeshState {
    ports: Vec<PortState>,
    queue_limit: Option<usize>,
    history_limit: Option<usize>,
    history: VecDeque<(String, Vec<u8>)>,
}

/// Shared broadcast medium
#[derive(Debug, Clone, Default)]
pub struct LoopbackMesh {
    state: Arc<Mutex<MeshState>>,
}

impl LoopbackMesh {
    /// Empty mesh with unbounded inboxes
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse broadcasts that would leave more than `limit` payloads
    /// waiting in any inbox
    pub fn with_queue_limit(self, limit: usize) -> Self {
        self.lock().queue_limit = Some(limit);
        self
    }

    /// Keep only the newest `limit` broadcasts in [`Self::history`]
    pub fn with_history_limit(self, limit: usize) -> Self {
        self.lock().history_limit = Some(limit);
        self
    }

    /// Attach a node. Ports start ready.
    pub fn port(&self, id: impl Into<String>) -> LoopbackPort {
        let mut state = self.lock();
        state.ports.push(PortState {
            id: id.into(),
            ready: true,
            channel_joins: 0,
            inbox: VecDeque::new(),
        });
        LoopbackPort { mesh: self.clone(), index: state.ports.len() - 1 }
    }

    /// Accepted broadcasts as `(sender id, payload)`, oldest first
    ///
    /// Unbounded unless [`Self::with_history_limit`] was set; long-running
    /// meshes should set one.
    pub fn history(&self) -> Vec<(String, Vec<u8>)> {
        self.lock().history.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, MeshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One node's attachment to a [`LoopbackMesh`]
#[derive(Debug, Clone)]
pub struct LoopbackPort {
    mesh: LoopbackMesh,
    index: usize,
}

impl LoopbackPort {
    /// Node id
    pub fn id(&self) -> String {
        self.mesh.lock().ports[self.index].id.clone()
    }

    /// Simulate the radio coming up or dropping out
    pub fn set_ready(&self, ready: bool) {
        self.mesh.lock().ports[self.index].ready = ready;
    }

    /// Times the default channel was selected
    pub fn channel_joins(&self) -> u32 {
        self.mesh.lock().ports[self.index].channel_joins
    }

    /// Payloads waiting for [`Transport::receive`]
    pub fn pending(&self) -> usize {
        self.mesh.lock().ports[self.index].inbox.len()
    }
}

impl Transport for LoopbackPort {
    fn is_ready(&self) -> bool {
        self.mesh.lock().ports[self.index].ready
    }

    fn select_default_channel(&mut self) {
        self.mesh.lock().ports[self.index].channel_joins += 1;
    }

    fn broadcast(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let mut state = self.mesh.lock();
        if !state.ports[self.index].ready {
            return Err(TransportError::NotReady);
        }
        if let Some(limit) = state.queue_limit {
            if state.ports.iter().any(|p| p.inbox.len() >= limit) {
                return Err(TransportError::NoBuffer);
            }
        }

        for port in state.ports.iter_mut() {
            port.inbox.push_back(payload.to_vec());
        }
        let sender = state.ports[self.index].id.clone();
        debug!("{} broadcast {} bytes", sender, payload.len());
        state.history.push_back((sender, payload.to_vec()));
        if let Some(limit) = state.history_limit {
            while state.history.len() > limit {
                state.history.pop_front();
            }
        }
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Option<usize> {
        let payload = self.mesh.lock().ports[self.index].inbox.pop_front()?;
        let len = payload.len().min(buf.len());
        buf[..len].copy_from_slice(&payload[..len]);
        Some(len)
    }
}
