// Callsim Core Library
// Simulated phone calls paced against synthesized audio

pub mod audio;
pub mod call;
pub mod config;
pub mod transport;

// Export core types
pub use audio::{AudioArtifact, ArtifactStore, ContainerFormat};
pub use call::{CallPhaseScheduler, CallSession, CallState, Phase, PhaseEvent, Timeline};
pub use config::{AudioConfig, FallbackConfig};
pub use transport::{CallSnapshot, ChannelSink, PhaseSink, StreamMessage};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CallSimError {
    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Unreadable media: {0}")]
    UnreadableMedia(String),

    #[error("Session cancelled")]
    CancelledSession,

    #[error("Call state error: {0}")]
    InvalidTransition(#[from] call::InvalidTransition),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CallSimError {
    /// Lookup and probe failures look the same to a caller: the audio is not there.
    pub fn is_missing_audio(&self) -> bool {
        matches!(
            self,
            CallSimError::ArtifactNotFound(_) | CallSimError::UnreadableMedia(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CallSimError>;
