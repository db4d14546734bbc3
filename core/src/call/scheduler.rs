//! Live phase delivery.
//!
//! Phases are released one at a time from a `DelayQueue` polled by the
//! session's own task. Nothing blocks between phases, so any number of
//! sessions can run side by side on the shared runtime.
//!
//! The queue only accepts deadlines up to about two years out, so a long
//! wait is split into legs of at most [`MAX_WAIT`]. A deadline past the end
//! of the clock never fires; the session then waits until cancelled.

use super::session::CallSession;
use super::timeline::Timeline;
use crate::transport::{PhaseSink, StreamMessage};
use crate::{CallSimError, Result};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::time::DelayQueue;
use tracing::{debug, info};

/// Longest single timer handed to the queue.
pub const MAX_WAIT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub struct CallPhaseScheduler {
    timeline: Timeline,
}

impl CallPhaseScheduler {
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }

    /// Replay the timeline against `sink`, holding each phase back until its
    /// offset has elapsed since the call started.
    ///
    /// Returns `CancelledSession` as soon as `cancel` fires or the sink goes
    /// away; the pending timer is dropped with the queue.
    pub async fn run<S: PhaseSink + ?Sized>(
        self,
        session: &mut CallSession,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut timers = DelayQueue::with_capacity(1);
        let start = Instant::now();

        for event in self.timeline.into_events() {
            let due = start.checked_add(event.offset());
            loop {
                let wait = due.map_or(MAX_WAIT, |at| at.saturating_duration_since(Instant::now()));
                let final_leg = due.is_some() && wait <= MAX_WAIT;
                timers.insert(event.phase, wait.min(MAX_WAIT));

                let expired = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!(target: "call", session = %session.id(), phase = %event.phase, "Cancelling pending phases");
                        return Err(CallSimError::CancelledSession);
                    }
                    next = std::future::poll_fn(|cx| timers.poll_expired(cx)) => next,
                };
                if expired.is_some() && final_leg {
                    break;
                }
                debug!(target: "call", session = %session.id(), phase = %event.phase, "Re-arming long wait");
            }

            session.enter(event.phase)?;
            debug!(
                target: "call",
                session = %session.id(),
                phase = %event.phase,
                offset_ms = event.offset_ms,
                "Emitting phase"
            );
            if sink.send(StreamMessage::Phase(event)).await.is_err() {
                return Err(CallSimError::CancelledSession);
            }
        }

        info!(target: "call", session = %session.id(), "Call ended");
        Ok(())
    }
}
