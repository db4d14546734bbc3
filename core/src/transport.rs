// Event transport
//
// The scheduler emits through a `PhaseSink`; the snapshot path returns a
// single `CallSnapshot` instead.

use crate::call::PhaseEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;

/// Single-response call status
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSnapshot {
    pub status: String,
    pub duration: u64,
    #[serde(rename = "toNumber")]
    pub to_number: Option<String>,
}

/// One message of a live call stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Phase(PhaseEvent),
    /// Terminal failure; never followed by another message
    Error { message: String },
}

impl StreamMessage {
    /// Event name on the wire
    pub fn event_name(&self) -> &'static str {
        match self {
            StreamMessage::Phase(ev) => ev.phase.as_str(),
            StreamMessage::Error { .. } => "error",
        }
    }

    /// JSON payload on the wire
    pub fn data(&self) -> serde_json::Value {
        match self {
            StreamMessage::Phase(ev) => {
                serde_json::to_value(&ev.payload).unwrap_or_else(|_| json!({}))
            }
            StreamMessage::Error { message } => json!({ "error": message }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("delivery sink closed")]
pub struct SinkClosed;

/// Live delivery target for a call session.
#[async_trait]
pub trait PhaseSink: Send {
    async fn send(&mut self, message: StreamMessage) -> Result<(), SinkClosed>;
}

/// Sink backed by a bounded channel; the receiving half feeds the HTTP stream.
pub struct ChannelSink {
    tx: mpsc::Sender<StreamMessage>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<StreamMessage>) -> Self {
        Self { tx }
    }

    /// Sink and its receiving half.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StreamMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl PhaseSink for ChannelSink {
    async fn send(&mut self, message: StreamMessage) -> Result<(), SinkClosed> {
        self.tx.send(message).await.map_err(|_| SinkClosed)
    }
}

#[async_trait]
impl PhaseSink for Vec<StreamMessage> {
    async fn send(&mut self, message: StreamMessage) -> Result<(), SinkClosed> {
        self.push(message);
        Ok(())
    }
}
