use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use callsim_core::call::{AUDIO_NOT_FOUND, INTERNAL_ERROR};
use callsim_core::CallSimError;
use callsim_speech::SpeechError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Call(#[from] CallSimError),

    #[error(transparent)]
    Speech(#[from] SpeechError),
}

fn call_error(e: &CallSimError) -> Response {
    match e {
        CallSimError::MissingInput(field) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Missing {field}") })),
        )
            .into_response(),
        e if e.is_missing_audio() => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": AUDIO_NOT_FOUND })),
        )
            .into_response(),
        e => {
            error!(target: "server", error = %e, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": INTERNAL_ERROR })),
            )
                .into_response()
        }
    }
}

fn speech_error(e: &SpeechError) -> Response {
    match e {
        SpeechError::MissingInput => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
        SpeechError::MissingApiKey => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
        SpeechError::Upstream {
            status,
            message,
            details,
        } => {
            let code = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut body = json!({
                "error": "ElevenLabs TTS error",
                "status": status,
                "details": details,
            });
            if let Some(m) = message {
                body["message"] = json!(m);
            }
            (code, Json(body)).into_response()
        }
        SpeechError::EmptyAudio | SpeechError::Http(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "ElevenLabs TTS error",
                "status": 500,
                "details": e.to_string(),
            })),
        )
            .into_response(),
        SpeechError::Core(inner) => call_error(inner),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Call(e) => call_error(e),
            ApiError::Speech(e) => speech_error(e),
        }
    }
}
