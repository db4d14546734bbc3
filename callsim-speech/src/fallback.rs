use callsim_core::audio::BeepSpec;
use callsim_core::{AudioArtifact, FallbackConfig};
use tracing::debug;

/// Local stand-in for speech: a plain sine tone sized to the text.
#[derive(Clone, Debug)]
pub struct BeepFallback {
    cfg: FallbackConfig,
}

impl BeepFallback {
    pub fn new(cfg: FallbackConfig) -> Self {
        Self { cfg }
    }

    /// `None` when fallback is switched off in config
    pub fn from_config(cfg: &FallbackConfig) -> Option<Self> {
        cfg.enabled.then(|| Self::new(cfg.clone()))
    }

    pub fn render(&self, text: &str) -> AudioArtifact {
        let secs = self.cfg.duration_for(text);
        debug!(target: "speech", secs, hz = self.cfg.tone_hz, "Rendering fallback tone");
        AudioArtifact::beep(&BeepSpec::new(secs, self.cfg.tone_hz))
    }
}
