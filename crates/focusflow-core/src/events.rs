use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::IntervalKind;
use crate::timer::RuntimeSnapshot;

/// Every state change in the engine produces an Event.
/// The CLI prints them as JSON lines; a UI would observe them to re-render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        interval_index: usize,
        interval_id: String,
        kind: IntervalKind,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        interval_index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        interval_index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The interval at `interval_index` ran out. Emitted in the same tick that
    /// advances the runtime, so queries already describe the next interval.
    IntervalCompleted {
        interval_index: usize,
        interval_id: String,
        kind: IntervalKind,
        at: DateTime<Utc>,
    },
    IntervalStarted {
        interval_index: usize,
        interval_id: String,
        label: String,
        kind: IntervalKind,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// The sequence wrapped back to its first interval.
    CycleCompleted {
        cycle_count: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        total_elapsed_secs: u64,
        cycle_count: u64,
        at: DateTime<Utc>,
    },
    SessionFinished {
        interval_index: usize,
        total_elapsed_secs: u64,
        cycle_count: u64,
        at: DateTime<Utc>,
    },
    /// Persisting a subtask's completion failed after finish. Informational.
    SubtaskSyncFailed {
        task_id: String,
        subtask_id: String,
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        #[serde(flatten)]
        snapshot: RuntimeSnapshot,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Stable name of the variant, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerResumed { .. } => "timer_resumed",
            Event::IntervalCompleted { .. } => "interval_completed",
            Event::IntervalStarted { .. } => "interval_started",
            Event::CycleCompleted { .. } => "cycle_completed",
            Event::TimerReset { .. } => "timer_reset",
            Event::SessionFinished { .. } => "session_finished",
            Event::SubtaskSyncFailed { .. } => "subtask_sync_failed",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}
