//! SQLite-backed session and task storage.
//!
//! Provides persistent storage for:
//! - Custom sessions (the [`SessionStore`] capability)
//! - Tasks and subtasks (the [`TaskStore`] capability)
//! - A log of finished focus sessions

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations};
use crate::error::{CoreError, StoreError};
use crate::session::{CustomSession, Interval, IntervalKind, Technique};
use crate::store::{SessionStore, TaskStore};
use crate::task::{Priority, Subtask, Task};

/// One finished focus session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub technique: Technique,
    pub session_name: String,
    pub task_id: Option<String>,
    pub total_elapsed_secs: u64,
    pub cycle_count: u64,
    pub subtasks_completed: u32,
    pub finished_at: DateTime<Utc>,
}

/// SQLite database for custom sessions, tasks and focus history.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `<data dir>/focusflow.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("focusflow.db");
        Self::open_path(&path)
    }

    pub fn open_path(path: &Path) -> Result<Self, CoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (tests and dry runs).
    pub fn open_memory() -> Result<Self, CoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database lock poisoned".into()))
    }

    /// Insert or replace a custom session and its intervals.
    pub fn save_custom_session(&self, session: &CustomSession) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO custom_sessions (id, owner_id, name) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET owner_id = excluded.owner_id, name = excluded.name",
            params![session.id, session.owner_id, session.name],
        )?;
        tx.execute(
            "DELETE FROM session_intervals WHERE session_id = ?1",
            params![session.id],
        )?;
        for (position, interval) in session.intervals.iter().enumerate() {
            tx.execute(
                "INSERT INTO session_intervals
                    (session_id, position, interval_id, label, duration_secs, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    session.id,
                    position as i64,
                    interval.id,
                    interval.label,
                    interval.duration_secs,
                    kind_str(interval.kind),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_session(
        conn: &Connection,
        id: String,
        owner_id: String,
        name: String,
    ) -> Result<CustomSession, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT interval_id, label, duration_secs, kind
             FROM session_intervals WHERE session_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut intervals = Vec::new();
        for row in rows {
            let (interval_id, label, duration_secs, kind) = row?;
            intervals.push(Interval {
                id: interval_id,
                label,
                duration_secs,
                kind: parse_kind(&kind)?,
            });
        }
        Ok(CustomSession {
            id,
            owner_id,
            name,
            intervals,
        })
    }

    /// Insert or replace a task and its subtasks.
    pub fn save_task(&self, task: &Task) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO tasks (id, title) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET title = excluded.title",
            params![task.id, task.title],
        )?;
        tx.execute("DELETE FROM subtasks WHERE task_id = ?1", params![task.id])?;
        for (position, subtask) in task.subtasks.iter().enumerate() {
            tx.execute(
                "INSERT INTO subtasks (task_id, id, position, title, completed, priority)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    task.id,
                    subtask.id,
                    position as i64,
                    subtask.title,
                    subtask.completed,
                    subtask.priority.as_str(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>, StoreError> {
        let conn = self.conn()?;
        let title: Option<String> = conn
            .query_row(
                "SELECT title FROM tasks WHERE id = ?1",
                params![task_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(title) = title else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT id, title, completed, priority FROM subtasks
             WHERE task_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![task_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut subtasks = Vec::new();
        for row in rows {
            let (id, title, completed, priority) = row?;
            let priority = priority
                .parse::<Priority>()
                .map_err(|e| StoreError::Serialization {
                    what: "subtask priority".into(),
                    message: e.to_string(),
                })?;
            subtasks.push(Subtask {
                id,
                title,
                completed,
                priority,
            });
        }
        Ok(Some(Task {
            id: task_id.to_string(),
            title,
            subtasks,
        }))
    }

    /// Append a finished focus session to the history.
    pub fn record_focus(&self, record: &FocusRecord) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO focus_log
                (technique, session_name, task_id, total_elapsed_secs, cycle_count,
                 subtasks_completed, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.technique.as_str(),
                record.session_name,
                record.task_id,
                record.total_elapsed_secs,
                record.cycle_count,
                record.subtasks_completed,
                record.finished_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent focus sessions first.
    pub fn recent_focus(&self, limit: usize) -> Result<Vec<FocusRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, technique, session_name, task_id, total_elapsed_secs, cycle_count,
                    subtasks_completed, finished_at
             FROM focus_log ORDER BY finished_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, u64>(4)?,
                row.get::<_, u64>(5)?,
                row.get::<_, u32>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, technique, session_name, task_id, elapsed, cycles, subtasks, finished_at) =
                row?;
            let technique = technique
                .parse::<Technique>()
                .map_err(|e| StoreError::Serialization {
                    what: "focus technique".into(),
                    message: e.to_string(),
                })?;
            let finished_at = DateTime::parse_from_rfc3339(&finished_at)
                .map_err(|e| StoreError::Serialization {
                    what: "focus timestamp".into(),
                    message: e.to_string(),
                })?
                .with_timezone(&Utc);
            records.push(FocusRecord {
                id: Some(id),
                technique,
                session_name,
                task_id,
                total_elapsed_secs: elapsed,
                cycle_count: cycles,
                subtasks_completed: subtasks,
                finished_at,
            });
        }
        Ok(records)
    }
}

impl SessionStore for Database {
    fn list(&self, owner_id: &str) -> Result<Vec<CustomSession>, StoreError> {
        let conn = self.conn()?;
        let heads = {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name FROM custom_sessions WHERE owner_id = ?1 ORDER BY seq",
            )?;
            let rows = stmt.query_map(params![owner_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;
            let heads: Vec<(String, String, String)> = rows.collect::<Result<_, _>>()?;
            heads
        };
        heads
            .into_iter()
            .map(|(id, owner, name)| Self::load_session(&conn, id, owner, name))
            .collect()
    }

    fn get(&self, session_id: &str) -> Result<Option<CustomSession>, StoreError> {
        let conn = self.conn()?;
        let head = conn
            .query_row(
                "SELECT id, owner_id, name FROM custom_sessions WHERE id = ?1",
                params![session_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        match head {
            Some((id, owner, name)) => Self::load_session(&conn, id, owner, name).map(Some),
            None => Ok(None),
        }
    }
}

impl TaskStore for Database {
    fn update_subtask_completion(
        &self,
        task_id: &str,
        subtask_id: &str,
        completed: bool,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE subtasks SET completed = ?1 WHERE task_id = ?2 AND id = ?3",
            params![completed, task_id, subtask_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                kind: "subtask",
                id: format!("{task_id}/{subtask_id}"),
            });
        }
        Ok(())
    }
}

fn kind_str(kind: IntervalKind) -> &'static str {
    match kind {
        IntervalKind::Work => "work",
        IntervalKind::Rest => "rest",
    }
}

fn parse_kind(s: &str) -> Result<IntervalKind, StoreError> {
    match s {
        "work" => Ok(IntervalKind::Work),
        "rest" => Ok(IntervalKind::Rest),
        other => Err(StoreError::Serialization {
            what: "interval kind".into(),
            message: format!("unknown kind '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(id: &str, owner: &str, durations: &[u64]) -> CustomSession {
        CustomSession {
            id: id.into(),
            owner_id: owner.into(),
            name: format!("Session {id}"),
            intervals: durations
                .iter()
                .enumerate()
                .map(|(i, d)| Interval {
                    id: format!("{id}-{i}"),
                    label: format!("Block {i}"),
                    duration_secs: *d,
                    kind: if i % 2 == 0 {
                        IntervalKind::Work
                    } else {
                        IntervalKind::Rest
                    },
                })
                .collect(),
        }
    }

    fn task() -> Task {
        Task {
            id: "t1".into(),
            title: "Ship release".into(),
            subtasks: vec![
                Subtask {
                    id: "changelog".into(),
                    title: "Write changelog".into(),
                    completed: false,
                    priority: Priority::Low,
                },
                Subtask {
                    id: "tag".into(),
                    title: "Tag version".into(),
                    completed: true,
                    priority: Priority::High,
                },
            ],
        }
    }

    #[test]
    fn custom_session_roundtrip_keeps_order() {
        let db = Database::open_memory().unwrap();
        let original = session("s1", "alice", &[1500, 0, 300]);
        db.save_custom_session(&original).unwrap();
        assert_eq!(db.get("s1").unwrap(), Some(original));
        assert_eq!(db.get("s2").unwrap(), None);
    }

    #[test]
    fn resaving_replaces_intervals() {
        let db = Database::open_memory().unwrap();
        db.save_custom_session(&session("s1", "alice", &[10, 20, 30]))
            .unwrap();
        db.save_custom_session(&session("s1", "alice", &[5])).unwrap();
        let stored = db.get("s1").unwrap().unwrap();
        assert_eq!(stored.intervals.len(), 1);
        assert_eq!(stored.intervals[0].duration_secs, 5);
    }

    #[test]
    fn list_filters_by_owner_in_authoring_order() {
        let db = Database::open_memory().unwrap();
        db.save_custom_session(&session("z", "alice", &[1])).unwrap();
        db.save_custom_session(&session("a", "alice", &[1])).unwrap();
        db.save_custom_session(&session("m", "bob", &[1])).unwrap();
        let ids: Vec<_> = db
            .list("alice")
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["z", "a"]);
        assert!(db.list("carol").unwrap().is_empty());
    }

    #[test]
    fn task_roundtrip_and_subtask_update() {
        let db = Database::open_memory().unwrap();
        db.save_task(&task()).unwrap();
        db.update_subtask_completion("t1", "changelog", true)
            .unwrap();
        let stored = db.get_task("t1").unwrap().unwrap();
        assert_eq!(stored.subtasks[0].id, "changelog");
        assert!(stored.subtasks[0].completed);
        assert_eq!(stored.subtasks[1].priority, Priority::High);
        assert!(db.get_task("t2").unwrap().is_none());
    }

    #[test]
    fn updating_unknown_subtask_is_not_found() {
        let db = Database::open_memory().unwrap();
        db.save_task(&task()).unwrap();
        let err = db.update_subtask_completion("t1", "nope", true);
        assert!(matches!(err, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn focus_history_newest_first() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        for (i, technique) in [Technique::Pomodoro, Technique::Flowtime].into_iter().enumerate() {
            db.record_focus(&FocusRecord {
                id: None,
                technique,
                session_name: technique.to_string(),
                task_id: Some("t1".into()),
                total_elapsed_secs: 100 * (i as u64 + 1),
                cycle_count: i as u64,
                subtasks_completed: 1,
                finished_at: now + Duration::minutes(i as i64),
            })
            .unwrap();
        }
        let recent = db.recent_focus(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].technique, Technique::Flowtime);
        assert_eq!(recent[0].total_elapsed_secs, 200);
        assert_eq!(db.recent_focus(1).unwrap().len(), 1);
    }

    #[test]
    fn file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focusflow.db");
        {
            let db = Database::open_path(&path).unwrap();
            db.save_custom_session(&session("s1", "alice", &[60])).unwrap();
        }
        let db = Database::open_path(&path).unwrap();
        assert!(db.get("s1").unwrap().is_some());
    }
}
