use crate::fallback::BeepFallback;
use crate::{Result, SpeechError};
use async_trait::async_trait;
use callsim_core::AudioArtifact;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Body of a generate-voice request
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "voiceId")]
    pub voice_id: String,
    #[serde(default, rename = "modelId", skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl SpeechRequest {
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() || self.voice_id.trim().is_empty() {
            return Err(SpeechError::MissingInput);
        }
        Ok(())
    }
}

/// A voice offered by the provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether credentials are present; an unconfigured provider is skipped.
    fn is_configured(&self) -> bool;

    async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioArtifact>;

    async fn voices(&self) -> Result<Vec<Voice>>;
}

/// Outcome of a generate request
#[derive(Debug)]
pub struct Generated {
    pub artifact: AudioArtifact,
    /// True when the tone fallback stood in for speech
    pub fallback: bool,
}

/// Provider plus fallback policy
#[derive(Clone)]
pub struct SpeechService {
    primary: Arc<dyn SpeechProvider>,
    fallback: Option<BeepFallback>,
}

impl SpeechService {
    pub fn new(primary: Arc<dyn SpeechProvider>, fallback: Option<BeepFallback>) -> Self {
        Self { primary, fallback }
    }

    pub fn provider_configured(&self) -> bool {
        self.primary.is_configured()
    }

    /// Synthesize speech, degrading to the tone fallback when allowed.
    pub async fn generate(&self, request: &SpeechRequest) -> Result<Generated> {
        request.validate()?;

        if !self.primary.is_configured() {
            return match &self.fallback {
                Some(fb) => {
                    info!(target: "speech", "No provider key; using tone fallback");
                    Ok(Generated {
                        artifact: fb.render(&request.text),
                        fallback: true,
                    })
                }
                None => Err(SpeechError::MissingApiKey),
            };
        }

        match self.primary.synthesize(request).await {
            Ok(artifact) => {
                info!(
                    target: "speech",
                    provider = self.primary.name(),
                    bytes = artifact.bytes.len(),
                    "Speech synthesized"
                );
                Ok(Generated {
                    artifact,
                    fallback: false,
                })
            }
            Err(e) => match &self.fallback {
                Some(fb) => {
                    warn!(
                        target: "speech",
                        provider = self.primary.name(),
                        error = %e,
                        "Speech synthesis failed; using tone fallback"
                    );
                    Ok(Generated {
                        artifact: fb.render(&request.text),
                        fallback: true,
                    })
                }
                None => Err(e),
            },
        }
    }

    pub async fn voices(&self) -> Result<Vec<Voice>> {
        if !self.primary.is_configured() {
            return Err(SpeechError::MissingApiKey);
        }
        self.primary.voices().await
    }
}
