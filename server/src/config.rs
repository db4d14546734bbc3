use std::fs;
use std::path::{Path, PathBuf};

use callsim_core::{AudioConfig, FallbackConfig};
use callsim_speech::ElevenLabsConfig;

/// Everything the HTTP server needs to start
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub audio: AudioConfig,
    pub elevenlabs: ElevenLabsConfig,
    /// Buffered phase messages per live stream
    pub sse_channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HOST")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(10_000),
            audio: AudioConfig::default(),
            elevenlabs: ElevenLabsConfig::default(),
            sse_channel_capacity: std::env::var("SSE_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|&n| n > 0)
                .unwrap_or(16),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file (path via CALLSIM_CONFIG or ./callsim.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let default = Self::default();
        let path = std::env::var("CALLSIM_CONFIG").unwrap_or_else(|_| "callsim.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::info!(target: "server", path = %path, "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match Self::overlay_str(default.clone(), &s) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(target: "server", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "server", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }

    /// Apply a TOML document on top of `base`.
    pub fn overlay_str(base: Self, toml_src: &str) -> Result<Self, toml::de::Error> {
        Ok(toml::from_str::<ServerToml>(toml_src)?.overlay(base))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ServerToml {
    host: Option<String>,
    port: Option<u16>,
    audio_dir: Option<PathBuf>,
    sse_channel_capacity: Option<usize>,
    elevenlabs: Option<ElevenLabsToml>,
    fallback: Option<FallbackToml>,
}

impl ServerToml {
    fn overlay(self, mut base: ServerConfig) -> ServerConfig {
        if let Some(h) = self.host {
            base.host = h;
        }
        if let Some(p) = self.port {
            base.port = p;
        }
        if let Some(d) = self.audio_dir {
            base.audio.audio_dir = d;
        }
        if let Some(n) = self.sse_channel_capacity.filter(|&n| n > 0) {
            base.sse_channel_capacity = n;
        }
        if let Some(e) = self.elevenlabs {
            e.apply(&mut base.elevenlabs);
        }
        if let Some(f) = self.fallback {
            f.apply(&mut base.audio.fallback);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ElevenLabsToml {
    api_key: Option<String>,
    base_url: Option<String>,
    model_id: Option<String>,
    request_timeout_ms: Option<u64>,
}

impl ElevenLabsToml {
    fn apply(self, cfg: &mut ElevenLabsConfig) {
        if let Some(k) = self.api_key.filter(|s| !s.is_empty()) {
            cfg.api_key = Some(k);
        }
        if let Some(u) = self.base_url {
            cfg.base_url = u;
        }
        if let Some(m) = self.model_id {
            cfg.model_id = m;
        }
        if let Some(t) = self.request_timeout_ms {
            cfg.request_timeout_ms = t;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct FallbackToml {
    enabled: Option<bool>,
    tone_hz: Option<f64>,
    min_secs: Option<f64>,
    max_secs: Option<f64>,
}

impl FallbackToml {
    fn apply(self, cfg: &mut FallbackConfig) {
        if let Some(v) = self.enabled {
            cfg.enabled = v;
        }
        if let Some(v) = self.tone_hz {
            cfg.tone_hz = v;
        }
        if let Some(v) = self.min_secs {
            cfg.min_secs = v;
        }
        if let Some(v) = self.max_secs {
            cfg.max_secs = v;
        }
    }
}
