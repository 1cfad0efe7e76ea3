//! Progress projection for rendering radial or linear indicators.
//!
//! Pure functions of `(duration, remaining)`; the runtime never stores a
//! fraction.

use crate::session::SessionPlan;

/// Seconds already spent in an interval.
pub fn elapsed_in_interval(duration_secs: u64, remaining_secs: u64) -> u64 {
    duration_secs.saturating_sub(remaining_secs)
}

/// Completion of one interval in `[0, 1]`. A zero-length interval is complete.
pub fn progress_fraction(duration_secs: u64, remaining_secs: u64) -> f64 {
    if duration_secs == 0 {
        return 1.0;
    }
    let elapsed = elapsed_in_interval(duration_secs, remaining_secs);
    (elapsed as f64 / duration_secs as f64).clamp(0.0, 1.0)
}

/// Completion of the current cycle through the plan in `[0, 1]`.
pub fn session_progress_fraction(plan: &SessionPlan, index: usize, remaining_secs: u64) -> f64 {
    let total = plan.total_duration_secs();
    if total == 0 {
        return 1.0;
    }
    let current = plan.interval(index).map(|i| i.duration_secs).unwrap_or(0);
    let done = plan.cumulative_secs(index) + elapsed_in_interval(current, remaining_secs);
    (done as f64 / total as f64).clamp(0.0, 1.0)
}
