//! Speech synthesis for simulated calls
//!
//! Turns text into a stored-ready [`AudioArtifact`] with graceful degradation:
//! - Prefer the ElevenLabs text-to-speech API (needs `ELEVENLABS_API_KEY`)
//! - Fall back to a locally synthesized tone when the key is missing or the
//!   provider fails, unless fallback is disabled
//!
//! Env overrides:
//! - ELEVENLABS_API_KEY, ELEVENLABS_BASE_URL, ELEVENLABS_MODEL_ID
//! - SPEECH_TIMEOUT_MS
//! - FALLBACK_ENABLED, FALLBACK_TONE_HZ, FALLBACK_MIN_SECS, FALLBACK_MAX_SECS

pub mod elevenlabs;
pub mod fallback;
pub mod provider;

pub use elevenlabs::{ElevenLabsConfig, ElevenLabsProvider};
pub use fallback::BeepFallback;
pub use provider::{Generated, SpeechProvider, SpeechRequest, SpeechService, Voice};

use callsim_core::CallSimError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Missing ELEVENLABS_API_KEY")]
    MissingApiKey,

    #[error("Missing text or voiceId")]
    MissingInput,

    #[error("ElevenLabs TTS error ({status})")]
    Upstream {
        status: u16,
        message: Option<String>,
        details: serde_json::Value,
    },

    #[error("Provider returned no audio")]
    EmptyAudio,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Core(#[from] CallSimError),
}

pub type Result<T> = std::result::Result<T, SpeechError>;
