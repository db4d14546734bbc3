//! Call phases and the cadence table that places them in time.

use serde::Serialize;
use std::time::Duration;

/// One named stage of a simulated call, in lifecycle order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initiated,
    Ringing,
    Connected,
    Playing,
    Ended,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initiated => "initiated",
            Phase::Ringing => "ringing",
            Phase::Connected => "connected",
            Phase::Playing => "playing",
            Phase::Ended => "ended",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a phase sits on the call clock, relative to t=0 at `initiated`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OffsetRule {
    /// Fixed offset in milliseconds
    Fixed(u64),
    /// `base_ms` plus the measured playback length plus `pad_secs`
    AfterPlayback { base_ms: u64, pad_secs: u64 },
}

impl OffsetRule {
    pub fn offset_ms(&self, duration_secs: u64) -> u64 {
        match *self {
            OffsetRule::Fixed(ms) => ms,
            OffsetRule::AfterPlayback { base_ms, pad_secs } => duration_secs
                .saturating_add(pad_secs)
                .saturating_mul(1000)
                .saturating_add(base_ms),
        }
    }
}

/// Playback begins here; `ended` is measured from the same point.
pub const PLAYBACK_START_MS: u64 = 1600;

/// Dial/ring/connect cadence. `ended` trails playback by one second to cover
/// the client's playback start latency.
pub const PHASE_TABLE: [(Phase, OffsetRule); 5] = [
    (Phase::Initiated, OffsetRule::Fixed(0)),
    (Phase::Ringing, OffsetRule::Fixed(300)),
    (Phase::Connected, OffsetRule::Fixed(1200)),
    (Phase::Playing, OffsetRule::Fixed(PLAYBACK_START_MS)),
    (
        Phase::Ended,
        OffsetRule::AfterPlayback {
            base_ms: PLAYBACK_START_MS,
            pad_secs: 1,
        },
    ),
];

/// JSON body carried by a phase message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PhasePayload {
    Target {
        #[serde(rename = "toNumber")]
        to_number: Option<String>,
    },
    Duration {
        duration: u64,
    },
    Empty {},
}

/// A phase placed on the call clock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PhaseEvent {
    pub phase: Phase,
    pub payload: PhasePayload,
    pub offset_ms: u64,
}

impl PhaseEvent {
    pub fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_ms)
    }
}
