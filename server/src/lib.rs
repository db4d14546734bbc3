//! Callsim HTTP server
//!
//! Routes:
//! - `GET /health`, `GET /voices`
//! - `POST /generate-voice` (alias `/generate-call`) and `GET /audio/:file`
//! - `POST /simulate-call` for snapshot delivery
//! - `GET /simulate-call-sse` for live delivery over Server-Sent Events

pub mod api;
pub mod config;
pub mod error;
pub mod sessions;
pub mod sse;

pub use config::ServerConfig;
pub use error::ApiError;
pub use sessions::SessionRegistry;

use axum::{
    routing::{get, post},
    Router,
};
use callsim_core::ArtifactStore;
use callsim_speech::{BeepFallback, ElevenLabsProvider, SpeechService};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ArtifactStore>,
    pub speech: SpeechService,
    pub sessions: Arc<SessionRegistry>,
    pub sse_channel_capacity: usize,
}

impl AppState {
    pub fn new(store: ArtifactStore, speech: SpeechService, sse_channel_capacity: usize) -> Self {
        Self {
            store: Arc::new(store),
            speech,
            sessions: Arc::new(SessionRegistry::new()),
            sse_channel_capacity: sse_channel_capacity.max(1),
        }
    }

    /// Open the artifact directory and wire the speech provider from config.
    pub fn from_config(cfg: &ServerConfig) -> Result<Self, ApiError> {
        let store = ArtifactStore::open(&cfg.audio.audio_dir)?;
        let provider = ElevenLabsProvider::new(cfg.elevenlabs.clone())?;
        let speech = SpeechService::new(
            Arc::new(provider),
            BeepFallback::from_config(&cfg.audio.fallback),
        );
        Ok(Self::new(store, speech, cfg.sse_channel_capacity))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::index_handler))
        .route("/favicon.ico", get(api::favicon_handler))
        .route("/health", get(api::health_handler))
        .route("/voices", get(api::voices_handler))
        .route("/generate-voice", post(api::generate_voice_handler))
        .route("/generate-call", post(api::generate_voice_handler))
        .route("/audio/:file", get(api::audio_handler))
        .route("/simulate-call", post(api::simulate_call_handler))
        .route("/simulate-call-sse", get(api::simulate_call_sse_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(cfg: ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = AppState::from_config(&cfg)?;
    let addr = cfg.addr();
    info!(
        target: "server",
        addr = %addr,
        audio_dir = ?cfg.audio.audio_dir,
        elevenlabs = state.speech.provider_configured(),
        fallback = cfg.audio.fallback.enabled,
        "Starting call simulator"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(target: "server", url = %format!("http://{}", addr), "Backend listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
