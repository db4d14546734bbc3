use crate::provider::{SpeechProvider, SpeechRequest, Voice};
use crate::{Result, SpeechError};
use async_trait::async_trait;
use callsim_core::AudioArtifact;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

/// ElevenLabs client settings loaded from environment variables
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: Option<String>,
    pub base_url: String, // e.g., https://api.elevenlabs.io/v1
    pub model_id: String,
    pub request_timeout_ms: u64,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ELEVENLABS_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            base_url: std::env::var("ELEVENLABS_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://api.elevenlabs.io/v1".to_string()),
            model_id: std::env::var("ELEVENLABS_MODEL_ID")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "eleven_multilingual_v2".to_string()),
            request_timeout_ms: std::env::var("SPEECH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
        }
    }
}

#[derive(Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<VoiceEntry>,
}

#[derive(Deserialize)]
struct VoiceEntry {
    voice_id: String,
    #[serde(default)]
    name: String,
}

/// Text-to-speech over the ElevenLabs REST API
#[derive(Clone)]
pub struct ElevenLabsProvider {
    http: Client,
    cfg: ElevenLabsConfig,
}

impl ElevenLabsProvider {
    pub fn new(cfg: ElevenLabsConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()?;
        Ok(Self { http, cfg })
    }

    fn api_key(&self) -> Result<&str> {
        self.cfg.api_key.as_deref().ok_or(SpeechError::MissingApiKey)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.cfg.base_url.trim_end_matches('/'), path)
    }

    async fn upstream_error(resp: reqwest::Response) -> SpeechError {
        let status = resp.status().as_u16();
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false);
        let body = resp.text().await.unwrap_or_default();
        let (message, details) = decode_error_body(&body, is_json);
        error!(target: "speech", status, message = ?message, "ElevenLabs TTS error");
        SpeechError::Upstream {
            status,
            message,
            details,
        }
    }
}

/// Pull a human-readable message out of a provider error body.
///
/// JSON bodies use `{detail: {message}}` or `{message}`; anything else is
/// passed through as text.
pub fn decode_error_body(body: &str, is_json: bool) -> (Option<String>, Value) {
    if is_json {
        if let Ok(details) = serde_json::from_str::<Value>(body) {
            let message = details
                .pointer("/detail/message")
                .or_else(|| details.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string);
            return (message, details);
        }
    }
    let message = (!body.is_empty()).then(|| body.to_string());
    (message, Value::String(body.to_string()))
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    fn is_configured(&self) -> bool {
        self.cfg.api_key.is_some()
    }

    async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioArtifact> {
        let key = self.api_key()?;
        let model_id = request
            .model_id
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.cfg.model_id);
        let url = self.endpoint(&format!("text-to-speech/{}", request.voice_id));
        debug!(target: "speech", %url, model_id, "Requesting speech");

        let resp = self
            .http
            .post(&url)
            .header("xi-api-key", key)
            .header(ACCEPT, "audio/mpeg")
            .json(&json!({ "text": request.text, "model_id": model_id }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::upstream_error(resp).await);
        }

        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        Ok(AudioArtifact::speech(bytes.to_vec()))
    }

    async fn voices(&self) -> Result<Vec<Voice>> {
        let key = self.api_key()?;
        let resp = self
            .http
            .get(self.endpoint("voices"))
            .header("xi-api-key", key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::upstream_error(resp).await);
        }

        let body: VoicesResponse = resp.json().await?;
        Ok(body
            .voices
            .into_iter()
            .map(|v| Voice {
                id: v.voice_id,
                name: v.name,
            })
            .collect())
    }
}
