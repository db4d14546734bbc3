// Audio artifacts: fallback synthesis, duration probing and storage

pub mod beep;
pub mod probe;
pub mod store;

// Shared audio utilities
pub(crate) mod utils;

pub use beep::BeepSpec;
pub use probe::{probe_duration, probe_file};
pub use store::ArtifactStore;

use serde::{Deserialize, Serialize};

/// Container layout of a stored artifact.
///
/// The file extension of a stored artifact always matches its byte layout,
/// since the duration probe picks its reader from this tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// Compressed speech as returned by the TTS provider
    Mp3,
    /// Raw 16-bit PCM in a RIFF/WAVE container
    Wav,
}

impl ContainerFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Mp3 => "mp3",
            ContainerFormat::Wav => "wav",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ContainerFormat::Mp3 => "audio/mpeg",
            ContainerFormat::Wav => "audio/wav",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => Some(ContainerFormat::Mp3),
            "wav" => Some(ContainerFormat::Wav),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A stored audio payload plus its container metadata.
///
/// `sample_rate`, `channels` and `bits_per_sample` are only known for raw PCM
/// containers produced locally.
#[derive(Clone, Debug)]
pub struct AudioArtifact {
    pub id: String,
    pub format: ContainerFormat,
    pub bytes: Vec<u8>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub bits_per_sample: Option<u16>,
}

impl AudioArtifact {
    /// Wrap provider speech (mp3) under a fresh identifier.
    pub fn speech(bytes: Vec<u8>) -> Self {
        Self {
            id: utils::gen_id(),
            format: ContainerFormat::Mp3,
            bytes,
            sample_rate: None,
            channels: None,
            bits_per_sample: None,
        }
    }

    /// Wrap a locally synthesized beep under a fresh identifier.
    pub fn beep(spec: &BeepSpec) -> Self {
        Self {
            id: utils::gen_id(),
            format: ContainerFormat::Wav,
            bytes: spec.synthesize(),
            sample_rate: Some(beep::SAMPLE_RATE),
            channels: Some(beep::CHANNELS),
            bits_per_sample: Some(beep::BITS_PER_SAMPLE),
        }
    }

    /// File name under which the artifact is stored: `<id>.<ext>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.format.extension())
    }

    /// Public URL path the artifact is served under.
    pub fn url(&self) -> String {
        format!("/audio/{}", self.file_name())
    }
}
