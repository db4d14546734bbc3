//! Call sessions
//!
//! A session lives exactly as long as one simulate request or stream. It is
//! never persisted and never shared: each live session owns its own
//! cancellation token.

use super::phase::Phase;
use super::scheduler::CallPhaseScheduler;
use super::state::CallState;
use super::timeline::Timeline;
use crate::audio::ArtifactStore;
use crate::transport::{CallSnapshot, PhaseSink, StreamMessage};
use crate::{CallSimError, Result};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Message sent to clients when the referenced audio cannot be used.
pub const AUDIO_NOT_FOUND: &str = "Audio not found";

/// Message sent to clients for every other failure; details stay in the log.
pub const INTERNAL_ERROR: &str = "Internal Server Error";

/// Inputs of a simulate-call request
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallRequest {
    #[serde(default, rename = "audioUrl")]
    pub audio_url: Option<String>,
    #[serde(default, rename = "toNumber")]
    pub to_number: Option<String>,
}

impl CallRequest {
    pub fn new(audio_url: impl Into<String>, to_number: Option<String>) -> Self {
        Self {
            audio_url: Some(audio_url.into()),
            to_number,
        }
    }

    /// The audio reference, or `MissingInput` when absent or blank.
    pub fn audio_ref(&self) -> Result<&str> {
        self.audio_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(CallSimError::MissingInput("audioUrl"))
    }

    /// Target identifier, with blank values treated as absent.
    pub fn target(&self) -> Option<String> {
        self.to_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug)]
pub struct CallSession {
    id: String,
    target: Option<String>,
    duration_secs: u64,
    state: CallState,
}

impl CallSession {
    pub fn new(id: impl Into<String>, target: Option<String>, duration_secs: u64) -> Self {
        Self {
            id: id.into(),
            target,
            duration_secs,
            state: CallState::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn timeline(&self) -> Timeline {
        Timeline::new(self.duration_secs, self.target.clone())
    }

    /// Record that `phase` has been emitted.
    pub fn enter(&mut self, phase: Phase) -> Result<()> {
        let next = self.state.advance(phase)?;
        debug!(target: "call", session = %self.id, from = ?self.state, to = ?next, "Call transition");
        self.state = next;
        Ok(())
    }

    pub fn fail(&mut self) {
        if let Ok(next) = self.state.fail() {
            self.state = next;
        }
    }
}

/// Snapshot delivery: measure the artifact and report `playing` at once.
pub async fn simulate_snapshot(store: &ArtifactStore, request: &CallRequest) -> Result<CallSnapshot> {
    let reference = request.audio_ref()?;
    let duration = store.measure(reference).await?;
    let snapshot = Timeline::new(duration, request.target()).snapshot();
    info!(
        target: "call",
        audio = %reference,
        duration,
        to = ?snapshot.to_number,
        "Snapshot call simulated"
    );
    Ok(snapshot)
}

/// Live delivery: measure the artifact, then pace every phase into `sink`.
///
/// Lookup and probe failures become a single `error` message. Cancellation,
/// whether through `cancel` or a closed sink, ends the session silently, even
/// while the probe is still in flight.
pub async fn simulate_live<S: PhaseSink + ?Sized>(
    session_id: &str,
    store: &ArtifactStore,
    request: &CallRequest,
    sink: &mut S,
    cancel: &CancellationToken,
) -> Result<()> {
    let reference = request.audio_ref()?;

    let measured = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(target: "call", session = %session_id, "Client left during probe");
            return Err(CallSimError::CancelledSession);
        }
        res = store.measure(reference) => res,
    };

    let duration = match measured {
        Ok(d) => d,
        Err(e) if e.is_missing_audio() => {
            warn!(target: "call", session = %session_id, audio = %reference, error = %e, "Audio unavailable");
            let _ = sink
                .send(StreamMessage::Error {
                    message: AUDIO_NOT_FOUND.to_string(),
                })
                .await;
            return Err(e);
        }
        Err(e) => {
            warn!(target: "call", session = %session_id, audio = %reference, error = %e, "Probe failed");
            let _ = sink
                .send(StreamMessage::Error {
                    message: INTERNAL_ERROR.to_string(),
                })
                .await;
            return Err(e);
        }
    };

    let mut session = CallSession::new(session_id, request.target(), duration);
    info!(
        target: "call",
        session = %session_id,
        duration,
        to = ?session.target(),
        "Live call started"
    );
    let scheduler = CallPhaseScheduler::new(session.timeline());
    let res = scheduler.run(&mut session, sink, cancel).await;
    if let Err(ref e) = res {
        if !matches!(e, CallSimError::CancelledSession) {
            session.fail();
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioArtifact, BeepSpec};

    #[test]
    fn request_validation() {
        assert!(matches!(
            CallRequest::default().audio_ref(),
            Err(CallSimError::MissingInput("audioUrl"))
        ));
        let blank = CallRequest::new("  ", Some(" ".into()));
        assert!(blank.audio_ref().is_err());
        assert_eq!(blank.target(), None);

        let ok = CallRequest::new("/audio/a.wav", Some("local-sim".into()));
        assert_eq!(ok.audio_ref().unwrap(), "/audio/a.wav");
        assert_eq!(ok.target().as_deref(), Some("local-sim"));
    }

    #[test]
    fn request_parses_camel_case() {
        let req: CallRequest =
            serde_json::from_str(r#"{"audioUrl":"/audio/x.mp3","toNumber":"+1555"}"#).unwrap();
        assert_eq!(req.audio_url.as_deref(), Some("/audio/x.mp3"));
        assert_eq!(req.to_number.as_deref(), Some("+1555"));
    }

    #[test]
    fn session_tracks_transitions() {
        let mut s = CallSession::new("s", None, 1);
        assert_eq!(s.state(), CallState::Idle);
        s.enter(Phase::Initiated).unwrap();
        assert!(s.enter(Phase::Playing).is_err());
        s.fail();
        assert_eq!(s.state(), CallState::Error);
    }

    #[tokio::test]
    async fn snapshot_for_three_second_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let artifact = AudioArtifact::beep(&BeepSpec::new(3.0, 440.0));
        store.put(&artifact).await.unwrap();

        let snap = simulate_snapshot(&store, &CallRequest::new(artifact.url(), None))
            .await
            .unwrap();
        assert_eq!(
            snap,
            CallSnapshot {
                status: "playing".into(),
                duration: 3,
                to_number: None,
            }
        );
    }

    #[tokio::test]
    async fn live_missing_audio_sends_single_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let mut sink: Vec<StreamMessage> = Vec::new();
        let cancel = CancellationToken::new();

        let res = simulate_live(
            "s-err",
            &store,
            &CallRequest::new("/audio/missing.mp3", None),
            &mut sink,
            &cancel,
        )
        .await;

        assert!(matches!(res, Err(CallSimError::ArtifactNotFound(_))));
        assert_eq!(
            sink,
            vec![StreamMessage::Error {
                message: AUDIO_NOT_FOUND.into()
            }]
        );
    }

    #[tokio::test]
    async fn live_cancelled_before_start_emits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let artifact = AudioArtifact::beep(&BeepSpec::new(2.0, 440.0));
        store.put(&artifact).await.unwrap();

        let mut sink: Vec<StreamMessage> = Vec::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res = simulate_live(
            "s-cancel",
            &store,
            &CallRequest::new(artifact.url(), None),
            &mut sink,
            &cancel,
        )
        .await;
        assert!(matches!(res, Err(CallSimError::CancelledSession)));
        assert!(sink.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn live_io_failure_hides_details() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let looped = dir.path().join("loop.wav");
        std::os::unix::fs::symlink(&looped, &looped).unwrap();

        let mut sink: Vec<StreamMessage> = Vec::new();
        let cancel = CancellationToken::new();
        let res = simulate_live(
            "s-io",
            &store,
            &CallRequest::new("/audio/loop.wav", None),
            &mut sink,
            &cancel,
        )
        .await;

        assert!(matches!(res, Err(CallSimError::Io(_))));
        assert_eq!(
            sink,
            vec![StreamMessage::Error {
                message: INTERNAL_ERROR.into()
            }]
        );
    }
}
