//! Timer runtime implementation.
//!
//! The runtime is a tick-driven state machine. It does not own a clock or a
//! thread: whoever owns it calls `tick()` once per elapsed second while it
//! runs (see [`crate::ticker`] for the async tick source). Tests drive it
//! synchronously.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!  ^         |
//!  +- reset -+          (any) -> Finished
//! ```
//!
//! An interval running out is not a resting state: the tick that empties it
//! advances to the next interval (wrapping to the first, which counts a cycle)
//! and the runtime keeps running.
//!
//! ## Usage
//!
//! ```ignore
//! let mut runtime = TimerRuntime::new(plan);
//! runtime.start();
//! // Once per second:
//! for event in runtime.tick() { /* render */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::progress::{elapsed_in_interval, progress_fraction, session_progress_fraction};
use crate::events::Event;
use crate::session::{Interval, IntervalKind, SessionPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Terminal. Only reachable through `finish()`.
    Finished,
}

/// Serializable view of the runtime for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeSnapshot {
    pub state: TimerState,
    pub interval_index: usize,
    pub interval_id: String,
    pub interval_label: String,
    pub kind: IntervalKind,
    pub duration_secs: u64,
    pub remaining_secs: u64,
    pub elapsed_in_interval_secs: u64,
    pub progress: f64,
    pub session_progress: f64,
    pub total_elapsed_secs: u64,
    pub cycle_count: u64,
    pub session_total_secs: u64,
}

/// Core timer runtime.
#[derive(Debug, Clone)]
pub struct TimerRuntime {
    plan: SessionPlan,
    state: TimerState,
    interval_index: usize,
    remaining_secs: u64,
    /// Seconds spent running since creation. Survives `reset()`.
    total_elapsed_secs: u64,
    /// Completed passes through the plan. Survives `reset()`.
    cycle_count: u64,
}

impl TimerRuntime {
    /// Create a runtime in the `Idle` state with the first interval ready.
    pub fn new(plan: SessionPlan) -> Self {
        let remaining_secs = plan.first_duration_secs();
        Self {
            plan,
            state: TimerState::Idle,
            interval_index: 0,
            remaining_secs,
            total_elapsed_secs: 0,
            cycle_count: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_finished(&self) -> bool {
        self.state == TimerState::Finished
    }

    pub fn interval_index(&self) -> usize {
        self.interval_index
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn total_elapsed_secs(&self) -> u64 {
        self.total_elapsed_secs
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn plan(&self) -> &SessionPlan {
        &self.plan
    }

    pub fn current_interval(&self) -> Option<&Interval> {
        self.plan.interval(self.interval_index)
    }

    fn current_duration_secs(&self) -> u64 {
        self.current_interval().map(|i| i.duration_secs).unwrap_or(0)
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        progress_fraction(self.current_duration_secs(), self.remaining_secs)
    }

    pub fn snapshot(&self) -> RuntimeSnapshot {
        let interval = self.current_interval();
        let duration_secs = self.current_duration_secs();
        RuntimeSnapshot {
            state: self.state,
            interval_index: self.interval_index,
            interval_id: interval.map(|i| i.id.clone()).unwrap_or_default(),
            interval_label: interval.map(|i| i.label.clone()).unwrap_or_default(),
            kind: interval.map(|i| i.kind).unwrap_or_default(),
            duration_secs,
            remaining_secs: self.remaining_secs,
            elapsed_in_interval_secs: elapsed_in_interval(duration_secs, self.remaining_secs),
            progress: self.progress(),
            session_progress: session_progress_fraction(
                &self.plan,
                self.interval_index,
                self.remaining_secs,
            ),
            total_elapsed_secs: self.total_elapsed_secs,
            cycle_count: self.cycle_count,
            session_total_secs: self.plan.total_duration_secs(),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot_event(&self) -> Event {
        Event::StateSnapshot {
            snapshot: self.snapshot(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idle/Paused -> Running. No-op when running or finished.
    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Idle => {
                self.state = TimerState::Running;
                let interval = self.current_interval()?;
                info!(
                    session = %self.plan.name,
                    interval = %interval.label,
                    remaining_secs = self.remaining_secs,
                    "timer started"
                );
                Some(Event::TimerStarted {
                    interval_index: self.interval_index,
                    interval_id: interval.id.clone(),
                    kind: interval.kind,
                    duration_secs: interval.duration_secs,
                    at: Utc::now(),
                })
            }
            TimerState::Paused => {
                self.state = TimerState::Running;
                debug!(remaining_secs = self.remaining_secs, "timer resumed");
                Some(Event::TimerResumed {
                    interval_index: self.interval_index,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            TimerState::Running | TimerState::Finished => None,
        }
    }

    /// Running -> Paused. No-op otherwise.
    pub fn pause(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused;
                debug!(remaining_secs = self.remaining_secs, "timer paused");
                Some(Event::TimerPaused {
                    interval_index: self.interval_index,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Back to the first interval. Counters are session-lifetime and survive.
    pub fn reset(&mut self) -> Option<Event> {
        if self.state == TimerState::Finished {
            return None;
        }
        self.state = TimerState::Idle;
        self.interval_index = 0;
        self.remaining_secs = self.plan.first_duration_secs();
        debug!(
            total_elapsed_secs = self.total_elapsed_secs,
            cycle_count = self.cycle_count,
            "timer reset"
        );
        Some(Event::TimerReset {
            total_elapsed_secs: self.total_elapsed_secs,
            cycle_count: self.cycle_count,
            at: Utc::now(),
        })
    }

    /// Any state -> Finished. Returns `None` when already finished.
    pub fn finish(&mut self) -> Option<Event> {
        if self.state == TimerState::Finished {
            return None;
        }
        self.state = TimerState::Finished;
        info!(
            session = %self.plan.name,
            total_elapsed_secs = self.total_elapsed_secs,
            cycle_count = self.cycle_count,
            "session finished"
        );
        Some(Event::SessionFinished {
            interval_index: self.interval_index,
            total_elapsed_secs: self.total_elapsed_secs,
            cycle_count: self.cycle_count,
            at: Utc::now(),
        })
    }

    /// Advance one second. Ignored unless running.
    ///
    /// Returns the transitions that happened during this second, in order.
    /// Zero-length intervals reached by a transition complete in the same tick.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.state != TimerState::Running {
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.total_elapsed_secs = self.total_elapsed_secs.saturating_add(1);

        let mut events = Vec::new();
        // Bounded so an all-zero plan completes one cycle per tick.
        let mut advances = 0;
        while self.remaining_secs == 0 && advances < self.plan.len() {
            self.complete_interval(&mut events);
            advances += 1;
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_interval(&mut self, events: &mut Vec<Event>) {
        let now = Utc::now();
        if let Some(done) = self.current_interval() {
            debug!(index = self.interval_index, interval = %done.label, "interval completed");
            events.push(Event::IntervalCompleted {
                interval_index: self.interval_index,
                interval_id: done.id.clone(),
                kind: done.kind,
                at: now,
            });
        }

        self.interval_index = (self.interval_index + 1) % self.plan.len().max(1);
        if self.interval_index == 0 {
            self.cycle_count += 1;
            events.push(Event::CycleCompleted {
                cycle_count: self.cycle_count,
                at: now,
            });
        }
        self.remaining_secs = self.current_duration_secs();

        if let Some(next) = self.current_interval() {
            events.push(Event::IntervalStarted {
                interval_index: self.interval_index,
                interval_id: next.id.clone(),
                label: next.label.clone(),
                kind: next.kind,
                duration_secs: next.duration_secs,
                at: now,
            });
        }
    }
}
