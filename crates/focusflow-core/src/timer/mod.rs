mod progress;
mod runtime;

pub use progress::{elapsed_in_interval, progress_fraction, session_progress_fraction};
pub use runtime::{RuntimeSnapshot, TimerRuntime, TimerState};
