pub mod config;
pub mod history;
pub mod session;
pub mod technique;
pub mod timer;

/// Print an event as one JSON line.
pub fn print_event(event: &focusflow_core::Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, event = event.name(), "failed to encode event"),
    }
}
