use super::phase::Phase;
use serde::Serialize;

/// Lifecycle of one simulated call.
///
/// `Idle → Initiated → Ringing → Connected → Playing → Ended`, with `Error`
/// reachable from any non-terminal state. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Idle,
    Initiated,
    Ringing,
    Connected,
    Playing,
    Ended,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid call transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: CallState,
    pub to: CallState,
}

impl From<Phase> for CallState {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Initiated => CallState::Initiated,
            Phase::Ringing => CallState::Ringing,
            Phase::Connected => CallState::Connected,
            Phase::Playing => CallState::Playing,
            Phase::Ended => CallState::Ended,
        }
    }
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Ended | CallState::Error)
    }

    /// The single state reachable by the next phase, if any.
    fn successor(&self) -> Option<CallState> {
        match self {
            CallState::Idle => Some(CallState::Initiated),
            CallState::Initiated => Some(CallState::Ringing),
            CallState::Ringing => Some(CallState::Connected),
            CallState::Connected => Some(CallState::Playing),
            CallState::Playing => Some(CallState::Ended),
            CallState::Ended | CallState::Error => None,
        }
    }

    /// Move to the state entered by `phase`.
    pub fn advance(self, phase: Phase) -> Result<CallState, InvalidTransition> {
        let to = CallState::from(phase);
        if self.successor() == Some(to) {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }

    /// Enter the error state; only valid before the call has finished.
    pub fn fail(self) -> Result<CallState, InvalidTransition> {
        if self.is_terminal() {
            Err(InvalidTransition {
                from: self,
                to: CallState::Error,
            })
        } else {
            Ok(CallState::Error)
        }
    }
}
