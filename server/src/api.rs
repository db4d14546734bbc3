// HTTP handlers
//
// Voice generation, artifact hosting and both call delivery modes.

use crate::error::ApiError;
use crate::sse::start_live_call;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{sse::KeepAlive, IntoResponse, Response, Sse},
    Json,
};
use callsim_core::call::{simulate_snapshot, CallRequest};
use callsim_core::{CallSnapshot, ContainerFormat};
use callsim_speech::{SpeechRequest, Voice};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

pub const BANNER: &str = "Call simulator backend is running!";

const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

pub async fn index_handler() -> &'static str {
    BANNER
}

pub async fn favicon_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Backend running",
        "elevenlabsKeyConfigured": state.speech.provider_configured(),
        "activeSessions": state.sessions.active(),
    }))
}

pub async fn voices_handler(State(state): State<AppState>) -> Result<Json<Vec<Voice>>, ApiError> {
    Ok(Json(state.speech.voices().await?))
}

#[derive(Debug, Serialize)]
pub struct GeneratedVoice {
    #[serde(rename = "audioUrl")]
    pub audio_url: String,
    pub format: ContainerFormat,
    pub fallback: bool,
}

/// `POST /generate-voice` and its `/generate-call` alias
pub async fn generate_voice_handler(
    State(state): State<AppState>,
    body: Option<Json<SpeechRequest>>,
) -> Result<Json<GeneratedVoice>, ApiError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let generated = state.speech.generate(&request).await?;
    state.store.put(&generated.artifact).await?;

    let audio_url = generated.artifact.url();
    info!(
        target: "server",
        audio = %audio_url,
        fallback = generated.fallback,
        "Voice generated"
    );
    Ok(Json(GeneratedVoice {
        audio_url,
        format: generated.artifact.format,
        fallback: generated.fallback,
    }))
}

/// Stored artifacts, served with a long-lived cache header
pub async fn audio_handler(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let (bytes, format) = state.store.read(&file).await?;
    Ok((
        [
            (header::CONTENT_TYPE, format.mime_type()),
            (header::CACHE_CONTROL, IMMUTABLE_CACHE),
        ],
        bytes,
    )
        .into_response())
}

/// Snapshot delivery
pub async fn simulate_call_handler(
    State(state): State<AppState>,
    body: Option<Json<CallRequest>>,
) -> Result<Json<CallSnapshot>, ApiError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    Ok(Json(simulate_snapshot(&state.store, &request).await?))
}

/// Live delivery over Server-Sent Events
pub async fn simulate_call_sse_handler(
    State(state): State<AppState>,
    Query(request): Query<CallRequest>,
) -> Result<Response, ApiError> {
    // A missing reference is a plain 400, before any stream is opened.
    let audio = request.audio_ref()?.to_string();

    let ticket = state.sessions.register(&audio, request.target());
    info!(target: "server", session = %ticket.id(), audio = %audio, "New SSE call stream");

    let stream = start_live_call(
        state.store.clone(),
        request,
        ticket,
        state.sse_channel_capacity,
    );
    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response())
}
