//! Engine configuration
//!
//! Defaults read from the environment; the server overlays an optional TOML
//! file on top of these.

use std::path::PathBuf;

/// Where artifacts live and how fallback audio is produced
#[derive(Clone, Debug)]
pub struct AudioConfig {
    pub audio_dir: PathBuf,
    pub fallback: FallbackConfig,
}

/// Fallback tone synthesis settings
#[derive(Clone, Debug, PartialEq)]
pub struct FallbackConfig {
    /// Synthesize a tone when speech synthesis is unavailable or fails
    pub enabled: bool,
    pub tone_hz: f64,
    pub min_secs: f64,
    pub max_secs: f64,
}

/// Seconds of tone per spoken word when standing in for speech
const SECS_PER_WORD: f64 = 0.4;

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            audio_dir: std::env::var("AUDIO_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public/audio")),
            fallback: FallbackConfig::default(),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: std::env::var("FALLBACK_ENABLED")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(true),
            tone_hz: env_f64("FALLBACK_TONE_HZ").unwrap_or(440.0),
            min_secs: env_f64("FALLBACK_MIN_SECS").unwrap_or(2.0),
            max_secs: env_f64("FALLBACK_MAX_SECS").unwrap_or(6.0),
        }
    }
}

impl FallbackConfig {
    /// Tone length standing in for `text`: a rough speaking pace, clamped to
    /// `[min_secs, max_secs]`.
    pub fn duration_for(&self, text: &str) -> f64 {
        let words = text.split_whitespace().count() as f64;
        let lo = self.min_secs.max(0.0);
        let hi = self.max_secs.max(lo);
        (words * SECS_PER_WORD).ceil().clamp(lo, hi)
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
