// Live call session registry
//
// Tracks streams currently pacing phases so health checks can report them.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct SessionInfo {
    audio: String,
    target: Option<String>,
    started: Instant,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    live: DashMap<String, SessionInfo>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live session; it stays listed until the ticket drops.
    pub fn register(self: &Arc<Self>, audio: &str, target: Option<String>) -> SessionTicket {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("call-{n}");
        self.live.insert(
            id.clone(),
            SessionInfo {
                audio: audio.to_string(),
                target,
                started: Instant::now(),
            },
        );
        debug!(target: "server", session = %id, active = self.live.len(), "Session registered");
        SessionTicket {
            id,
            registry: Arc::clone(self),
        }
    }

    pub fn active(&self) -> usize {
        self.live.len()
    }
}

/// Holds a session's slot in the registry
#[derive(Debug)]
pub struct SessionTicket {
    id: String,
    registry: Arc<SessionRegistry>,
}

impl SessionTicket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for SessionTicket {
    fn drop(&mut self) {
        if let Some((_, info)) = self.registry.live.remove(&self.id) {
            debug!(
                target: "server",
                session = %self.id,
                audio = %info.audio,
                to = info.target.as_deref().unwrap_or("-"),
                elapsed_ms = info.started.elapsed().as_millis() as u64,
                "Session deregistered"
            );
        }
    }
}
