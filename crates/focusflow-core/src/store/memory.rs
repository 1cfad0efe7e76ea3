use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{SessionStore, TaskStore};
use crate::error::StoreError;
use crate::session::CustomSession;
use crate::task::Task;

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("store lock poisoned".into())
}

/// Custom sessions held in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<Vec<CustomSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id.
    pub fn insert(&self, session: CustomSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().map_err(poisoned)?;
        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session,
            None => sessions.push(session),
        }
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    fn list(&self, owner_id: &str) -> Result<Vec<CustomSession>, StoreError> {
        let sessions = self.sessions.lock().map_err(poisoned)?;
        Ok(sessions
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn get(&self, session_id: &str) -> Result<Option<CustomSession>, StoreError> {
        let sessions = self.sessions.lock().map_err(poisoned)?;
        Ok(sessions.iter().find(|s| s.id == session_id).cloned())
    }
}

/// One recorded `update_subtask_completion` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtaskUpdate {
    pub task_id: String,
    pub subtask_id: String,
    pub completed: bool,
}

/// Tasks held in memory. Records every update call, including failed ones.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<String, Task>>,
    calls: Mutex<Vec<SubtaskUpdate>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, task: Task) -> Result<(), StoreError> {
        self.tasks
            .lock()
            .map_err(poisoned)?
            .insert(task.id.clone(), task);
        Ok(())
    }

    pub fn task(&self, task_id: &str) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.lock().map_err(poisoned)?.get(task_id).cloned())
    }

    /// Make every update for `subtask_id` fail with [`StoreError::Unavailable`].
    pub fn fail_subtask(&self, subtask_id: impl Into<String>) -> Result<(), StoreError> {
        self.failing
            .lock()
            .map_err(poisoned)?
            .insert(subtask_id.into());
        Ok(())
    }

    pub fn calls(&self) -> Result<Vec<SubtaskUpdate>, StoreError> {
        Ok(self.calls.lock().map_err(poisoned)?.clone())
    }
}

impl TaskStore for MemoryTaskStore {
    fn update_subtask_completion(
        &self,
        task_id: &str,
        subtask_id: &str,
        completed: bool,
    ) -> Result<(), StoreError> {
        self.calls.lock().map_err(poisoned)?.push(SubtaskUpdate {
            task_id: task_id.to_string(),
            subtask_id: subtask_id.to_string(),
            completed,
        });

        if self.failing.lock().map_err(poisoned)?.contains(subtask_id) {
            return Err(StoreError::Unavailable(format!(
                "update rejected for subtask '{subtask_id}'"
            )));
        }

        let mut tasks = self.tasks.lock().map_err(poisoned)?;
        let task = tasks.get_mut(task_id).ok_or_else(|| StoreError::NotFound {
            kind: "task",
            id: task_id.to_string(),
        })?;
        let subtask = task
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "subtask",
                id: subtask_id.to_string(),
            })?;
        subtask.completed = completed;
        Ok(())
    }
}
