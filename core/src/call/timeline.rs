use super::phase::{Phase, PhaseEvent, PhasePayload, PHASE_TABLE};
use crate::transport::CallSnapshot;

/// The full, ordered phase plan for one call.
///
/// Built from [`PHASE_TABLE`] and a measured duration; carries no timers and no
/// transport, so it can be inspected and tested on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeline {
    target: Option<String>,
    duration_secs: u64,
    events: Vec<PhaseEvent>,
}

impl Timeline {
    pub fn new(duration_secs: u64, target: Option<String>) -> Self {
        let events = PHASE_TABLE
            .iter()
            .map(|(phase, rule)| PhaseEvent {
                phase: *phase,
                payload: payload_for(*phase, duration_secs, target.as_deref()),
                offset_ms: rule.offset_ms(duration_secs),
            })
            .collect();
        Self {
            target,
            duration_secs,
            events,
        }
    }

    pub fn events(&self) -> &[PhaseEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<PhaseEvent> {
        self.events
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Single-response view: jumps straight to `playing`. There is no channel
    /// for later updates, so the caller infers `ended` after `duration + 1` s.
    pub fn snapshot(&self) -> CallSnapshot {
        CallSnapshot {
            status: Phase::Playing.as_str().to_string(),
            duration: self.duration_secs,
            to_number: self.target.clone(),
        }
    }
}

fn payload_for(phase: Phase, duration_secs: u64, target: Option<&str>) -> PhasePayload {
    match phase {
        Phase::Initiated => PhasePayload::Target {
            to_number: target.map(str::to_string),
        },
        Phase::Playing => PhasePayload::Duration {
            duration: duration_secs,
        },
        Phase::Ringing | Phase::Connected | Phase::Ended => PhasePayload::Empty {},
    }
}
