//! Collaborator capabilities the engine is built against.
//!
//! The engine never reaches for a global backend handle: a [`SessionStore`]
//! and a [`TaskStore`] are injected at construction. [`crate::storage::Database`]
//! implements both on SQLite; the in-memory fakes here back tests and dry runs.

mod memory;

pub use memory::{MemorySessionStore, MemoryTaskStore, SubtaskUpdate};

use crate::error::StoreError;
use crate::session::CustomSession;

/// Read access to user-authored custom sessions.
pub trait SessionStore: Send + Sync {
    /// Sessions authored by `owner_id`, in authoring order.
    fn list(&self, owner_id: &str) -> Result<Vec<CustomSession>, StoreError>;

    /// `Ok(None)` when no session has this id.
    fn get(&self, session_id: &str) -> Result<Option<CustomSession>, StoreError>;
}

/// Write access to subtask completion flags.
pub trait TaskStore: Send + Sync {
    fn update_subtask_completion(
        &self,
        task_id: &str,
        subtask_id: &str,
        completed: bool,
    ) -> Result<(), StoreError>;
}
