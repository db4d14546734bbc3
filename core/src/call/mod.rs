// Call simulation: phase cadence, lifecycle state and live scheduling

pub mod phase;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod timeline;

pub use phase::{OffsetRule, Phase, PhaseEvent, PhasePayload, PHASE_TABLE};
pub use scheduler::CallPhaseScheduler;
pub use session::{
    simulate_live, simulate_snapshot, CallRequest, CallSession, AUDIO_NOT_FOUND,
    INTERNAL_ERROR,
};
pub use state::{CallState, InvalidTransition};
pub use timeline::Timeline;
