//! Artifact store
//!
//! Flat directory of immutable audio files named `<id>.<ext>`. Artifacts are
//! written once through a temporary file and renamed into place, so a reader
//! never observes a partial container.

use crate::audio::{probe, AudioArtifact, ContainerFormat};
use crate::{CallSimError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A resolved reference to a stored artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredAudio {
    pub file_name: String,
    pub path: PathBuf,
    pub format: ContainerFormat,
}

#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if needed) the artifact directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        info!(target: "artifact", root = ?root, "Artifact store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist an artifact and return the resolved location.
    pub async fn put(&self, artifact: &AudioArtifact) -> Result<StoredAudio> {
        let file_name = artifact.file_name();
        let path = self.root.join(&file_name);
        let partial = self.root.join(format!(".{file_name}.part"));

        tokio::fs::write(&partial, &artifact.bytes).await?;
        tokio::fs::rename(&partial, &path).await?;

        debug!(
            target: "artifact",
            file = %file_name,
            bytes = artifact.bytes.len(),
            "Stored artifact"
        );
        Ok(StoredAudio {
            file_name,
            path,
            format: artifact.format,
        })
    }

    /// Map an audio reference (`/audio/<file>`, a full URL, or a bare file
    /// name) to its place in the store. Only the final path segment is
    /// honoured; the file system is not consulted.
    pub fn resolve(&self, reference: &str) -> Result<StoredAudio> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(CallSimError::MissingInput("audioUrl"));
        }
        let without_query = reference
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let file_name = without_query
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();

        if file_name.is_empty() || file_name.starts_with('.') {
            return Err(CallSimError::ArtifactNotFound(reference.to_string()));
        }

        let format = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ContainerFormat::from_extension)
            .ok_or_else(|| {
                CallSimError::UnreadableMedia(format!("unknown container: {file_name}"))
            })?;

        Ok(StoredAudio {
            file_name: file_name.to_string(),
            path: self.root.join(file_name),
            format,
        })
    }

    /// Resolve a reference and check that a regular file backs it.
    pub async fn locate(&self, reference: &str) -> Result<StoredAudio> {
        let stored = self.resolve(reference)?;
        match tokio::fs::metadata(&stored.path).await {
            Ok(meta) if meta.is_file() => Ok(stored),
            Ok(_) => Err(CallSimError::ArtifactNotFound(stored.file_name)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(CallSimError::ArtifactNotFound(stored.file_name))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read a stored artifact's bytes for hosting.
    pub async fn read(&self, reference: &str) -> Result<(Vec<u8>, ContainerFormat)> {
        let stored = self.locate(reference).await?;
        let bytes = tokio::fs::read(&stored.path).await?;
        Ok((bytes, stored.format))
    }

    /// Resolve and measure an artifact's playback duration in whole seconds.
    pub async fn measure(&self, reference: &str) -> Result<u64> {
        let stored = self.locate(reference).await?;
        probe::probe_path(stored.path, stored.format).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BeepSpec;

    #[tokio::test]
    async fn put_then_resolve_by_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let artifact = AudioArtifact::beep(&BeepSpec::new(2.0, 440.0));

        let stored = store.put(&artifact).await.unwrap();
        assert!(stored.path.exists());

        let resolved = store.locate(&artifact.url()).await.unwrap();
        assert_eq!(resolved, stored);

        let full = format!("http://localhost:10000{}?t=1", artifact.url());
        assert_eq!(store.resolve(&full).unwrap().file_name, artifact.file_name());
    }

    #[tokio::test]
    async fn no_partial_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        store
            .put(&AudioArtifact::beep(&BeepSpec::new(2.0, 440.0)))
            .await
            .unwrap();
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".wav"));
    }

    #[tokio::test]
    async fn measure_reports_whole_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let artifact = AudioArtifact::beep(&BeepSpec::new(2.5, 440.0));
        store.put(&artifact).await.unwrap();

        assert_eq!(store.measure(&artifact.url()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn traversal_and_missing_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("audio")).unwrap();
        std::fs::write(dir.path().join("secret.wav"), b"RIFF").unwrap();
        std::fs::create_dir(store.root().join("dir.wav")).unwrap();

        for reference in ["/audio/../secret.wav/..", "..", "/audio/", "nope.wav", "/audio/dir.wav"] {
            let err = store.locate(reference).await.unwrap_err();
            assert!(
                matches!(err, CallSimError::ArtifactNotFound(_)),
                "{reference}: {err}"
            );
        }
        assert!(matches!(
            store.resolve("   ").unwrap_err(),
            CallSimError::MissingInput(_)
        ));
    }

    #[test]
    fn unknown_extension_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("clip.ogg"), b"OggS").unwrap();
        assert!(matches!(
            store.resolve("/audio/clip.ogg").unwrap_err(),
            CallSimError::UnreadableMedia(_)
        ));
    }

    #[tokio::test]
    async fn zero_byte_artifact_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("empty.mp3"), b"").unwrap();
        let err = store.measure("/audio/empty.mp3").await.unwrap_err();
        assert!(matches!(err, CallSimError::UnreadableMedia(_)));
    }

    #[test]
    fn resolve_does_not_touch_the_disk() {
        let store = ArtifactStore {
            root: PathBuf::from("/nonexistent/callsim"),
        };
        let stored = store.resolve("/audio/later.mp3").unwrap();
        assert_eq!(stored.path, Path::new("/nonexistent/callsim/later.mp3"));
        assert_eq!(stored.format, ContainerFormat::Mp3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unexpected_io_errors_are_not_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let looped = dir.path().join("loop.wav");
        std::os::unix::fs::symlink(&looped, &looped).unwrap();

        let err = store.measure("/audio/loop.wav").await.unwrap_err();
        assert!(matches!(err, CallSimError::Io(_)), "{err}");
        assert!(!err.is_missing_audio());
    }
}
