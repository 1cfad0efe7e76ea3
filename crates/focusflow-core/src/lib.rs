//! # Focusflow Core Library
//!
//! This library provides the focus-timer engine behind Focusflow: Pomodoro,
//! Timeboxing, Flowtime and user-authored custom interval sessions, all played
//! back by one tick-driven runtime. The CLI is a thin layer over the same
//! library.
//!
//! ## Architecture
//!
//! - **Session Definition**: resolves a technique tag (or a custom session id)
//!   into an ordered interval plan
//! - **Timer Runtime**: a state machine that the owner ticks once per second;
//!   intervals cycle forever until the session is finished
//! - **Progress Projector**: pure `(duration, remaining) -> [0, 1]` helpers
//! - **Stores**: injected session/task capabilities, with SQLite and in-memory
//!   implementations
//!
//! ## Key Components
//!
//! - [`TimerRuntime`]: Core timer state machine
//! - [`SessionResolver`]: Technique/custom-session resolution
//! - [`FocusSession`]: Runtime bound to a task, syncing subtasks on finish
//! - [`TickSource`]: Cancellable one-second tick source
//! - [`Database`]: SQLite store for sessions, tasks and focus history
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod focus;
pub mod session;
pub mod storage;
pub mod store;
pub mod task;
pub mod ticker;
pub mod timer;

pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use focus::{FinishReport, FocusSession};
pub use session::{
    CustomSession, Interval, IntervalKind, SessionPlan, SessionResolver, Technique,
    TechniqueDurations, TechniqueTable,
};
pub use storage::{Config, Database, FocusRecord};
pub use store::{MemorySessionStore, MemoryTaskStore, SessionStore, TaskStore};
pub use task::{Priority, Subtask, Task};
pub use ticker::{drive, DriveExit, Tick, TickSource};
pub use timer::{progress_fraction, RuntimeSnapshot, TimerRuntime, TimerState};
