//! A focus session: one timer runtime bound to one task.
//!
//! Subtasks ticked off while the timer runs are remembered here and written
//! to the [`TaskStore`] once, when the session finishes. Store failures are
//! logged and reported as events; they never undo the finish.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::events::Event;
use crate::store::TaskStore;
use crate::timer::{RuntimeSnapshot, TimerRuntime, TimerState};

/// Outcome of [`FocusSession::finish`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinishReport {
    pub events: Vec<Event>,
    /// Subtask ids persisted as complete.
    pub synced: Vec<String>,
    /// Subtask ids whose update failed.
    pub failed: Vec<String>,
}

impl FinishReport {
    /// True when this call actually finished the session.
    pub fn finished(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, Event::SessionFinished { .. }))
    }
}

pub struct FocusSession {
    runtime: TimerRuntime,
    task_id: Option<String>,
    task_store: Arc<dyn TaskStore>,
    /// (subtask id, completed), in first-marked order.
    marks: Vec<(String, bool)>,
}

impl FocusSession {
    pub fn new(
        runtime: TimerRuntime,
        task_id: Option<String>,
        task_store: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            runtime,
            task_id,
            task_store,
            marks: Vec::new(),
        }
    }

    pub fn runtime(&self) -> &TimerRuntime {
        &self.runtime
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn state(&self) -> TimerState {
        self.runtime.state()
    }

    pub fn snapshot(&self) -> RuntimeSnapshot {
        self.runtime.snapshot()
    }

    /// Subtasks currently marked complete, in marking order.
    pub fn completed_subtasks(&self) -> Vec<&str> {
        self.marks
            .iter()
            .filter(|(_, done)| *done)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Record a subtask toggle. Last toggle wins. Ignored once finished.
    pub fn mark_subtask(&mut self, subtask_id: impl Into<String>, completed: bool) {
        if self.runtime.is_finished() {
            return;
        }
        let subtask_id = subtask_id.into();
        match self.marks.iter_mut().find(|(id, _)| *id == subtask_id) {
            Some(mark) => mark.1 = completed,
            None => self.marks.push((subtask_id, completed)),
        }
    }

    pub fn start(&mut self) -> Option<Event> {
        self.runtime.start()
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.runtime.pause()
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.runtime.reset()
    }

    pub fn tick(&mut self) -> Vec<Event> {
        self.runtime.tick()
    }

    /// Finish the session and persist completed subtasks.
    ///
    /// Only the first call has effects. Each completed subtask gets exactly one
    /// store call; a failing call does not stop the rest.
    pub fn finish(&mut self) -> FinishReport {
        let mut report = FinishReport::default();
        let Some(finished) = self.runtime.finish() else {
            return report;
        };
        report.events.push(finished);

        let Some(task_id) = self.task_id.clone() else {
            if !self.marks.is_empty() {
                warn!("subtasks were marked without a task; nothing to sync");
            }
            return report;
        };

        for (subtask_id, done) in &self.marks {
            if !*done {
                continue;
            }
            match self
                .task_store
                .update_subtask_completion(&task_id, subtask_id, true)
            {
                Ok(()) => {
                    debug!(task_id = %task_id, subtask_id = %subtask_id, "subtask synced");
                    report.synced.push(subtask_id.clone());
                }
                Err(e) => {
                    warn!(
                        task_id = %task_id,
                        subtask_id = %subtask_id,
                        error = %e,
                        "failed to persist subtask completion"
                    );
                    report.failed.push(subtask_id.clone());
                    report.events.push(Event::SubtaskSyncFailed {
                        task_id: task_id.clone(),
                        subtask_id: subtask_id.clone(),
                        message: e.to_string(),
                        at: Utc::now(),
                    });
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionPlan, Technique, TechniqueDurations};
    use crate::store::MemoryTaskStore;
    use crate::task::{Priority, Subtask, Task};

    fn task() -> Task {
        let sub = |id: &str| Subtask {
            id: id.into(),
            title: format!("Step {id}"),
            completed: false,
            priority: Priority::Low,
        };
        Task {
            id: "t1".into(),
            title: "Thesis".into(),
            subtasks: vec![sub("a"), sub("b"), sub("c")],
        }
    }

    fn session(store: Arc<MemoryTaskStore>, task_id: Option<&str>) -> FocusSession {
        let plan = SessionPlan::standard(
            Technique::Timeboxing,
            TechniqueDurations::from_minutes(30, 10),
        )
        .unwrap();
        FocusSession::new(TimerRuntime::new(plan), task_id.map(String::from), store)
    }

    #[test]
    fn finish_syncs_each_completed_subtask_once() {
        let store = Arc::new(MemoryTaskStore::new());
        store.insert(task()).unwrap();
        let mut focus = session(store.clone(), Some("t1"));
        focus.start();
        focus.tick();
        focus.mark_subtask("a", true);
        focus.mark_subtask("b", true);
        focus.mark_subtask("c", true);
        focus.mark_subtask("b", false);
        focus.pause();

        let report = focus.finish();
        assert!(report.finished());
        assert_eq!(report.synced, ["a", "c"]);
        assert_eq!(focus.state(), TimerState::Finished);

        let second = focus.finish();
        assert!(!second.finished());
        assert!(second.events.is_empty());
        assert_eq!(store.calls().unwrap().len(), 2);

        let stored = store.task("t1").unwrap().unwrap();
        assert_eq!(stored.completed_count(), 2);
    }

    #[test]
    fn failed_update_is_reported_and_does_not_block() {
        let store = Arc::new(MemoryTaskStore::new());
        store.insert(task()).unwrap();
        store.fail_subtask("a").unwrap();
        let mut focus = session(store.clone(), Some("t1"));
        focus.start();
        focus.mark_subtask("a", true);
        focus.mark_subtask("b", true);

        let report = focus.finish();
        assert_eq!(report.failed, ["a"]);
        assert_eq!(report.synced, ["b"]);
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, Event::SubtaskSyncFailed { subtask_id, .. } if subtask_id == "a")));
        assert_eq!(focus.state(), TimerState::Finished);
    }

    #[test]
    fn no_task_means_no_store_calls() {
        let store = Arc::new(MemoryTaskStore::new());
        let mut focus = session(store.clone(), None);
        focus.mark_subtask("a", true);
        assert!(focus.finish().finished());
        assert!(store.calls().unwrap().is_empty());
    }

    #[test]
    fn marks_after_finish_are_ignored() {
        let store = Arc::new(MemoryTaskStore::new());
        let mut focus = session(store, Some("t1"));
        focus.finish();
        focus.mark_subtask("a", true);
        assert!(focus.completed_subtasks().is_empty());
    }
}
