//! End-to-end timer scenarios against in-memory stores.

use std::sync::Arc;

use focusflow_core::{
    progress_fraction, CoreError, CustomSession, Event, FocusSession, Interval, IntervalKind,
    MemorySessionStore, MemoryTaskStore, Priority, SessionResolver, Subtask, Task, Technique,
    TimerRuntime, TimerState,
};

fn resolver_with(sessions: Vec<CustomSession>) -> SessionResolver {
    let store = MemorySessionStore::new();
    for session in sessions {
        store.insert(session).unwrap();
    }
    SessionResolver::new(Arc::new(store))
}

fn custom_session(id: &str, durations: &[u64]) -> CustomSession {
    CustomSession {
        id: id.into(),
        owner_id: "alice".into(),
        name: "Reading sprint".into(),
        intervals: durations
            .iter()
            .enumerate()
            .map(|(i, d)| Interval {
                id: format!("{id}-{i}"),
                label: format!("Chapter {}", i + 1),
                duration_secs: *d,
                kind: IntervalKind::Work,
            })
            .collect(),
    }
}

fn tick_n(runtime: &mut TimerRuntime, n: u64) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..n {
        events.extend(runtime.tick());
    }
    events
}

#[test]
fn pomodoro_work_rest_cycle() {
    let plan = resolver_with(vec![])
        .resolve(Technique::Pomodoro, None)
        .unwrap();
    let mut runtime = TimerRuntime::new(plan);
    runtime.start();

    tick_n(&mut runtime, 1500);
    assert_eq!(runtime.interval_index(), 1);
    assert_eq!(runtime.remaining_secs(), 300);

    tick_n(&mut runtime, 300);
    assert_eq!(runtime.interval_index(), 0);
    assert_eq!(runtime.cycle_count(), 1);
    assert_eq!(runtime.total_elapsed_secs(), 1800);
}

#[test]
fn every_technique_cycles_after_its_total_duration() {
    let resolver = resolver_with(vec![custom_session("mix", &[45, 15, 0, 20])]);
    for (technique, id) in [
        (Technique::Pomodoro, None),
        (Technique::Timeboxing, None),
        (Technique::Flowtime, None),
        (Technique::Custom, Some("mix")),
    ] {
        let plan = resolver.resolve(technique, id).unwrap();
        let total = plan.total_duration_secs();
        let mut runtime = TimerRuntime::new(plan);
        runtime.start();
        tick_n(&mut runtime, total);
        assert_eq!(runtime.cycle_count(), 1, "{technique}");
        assert_eq!(runtime.interval_index(), 0, "{technique}");
    }
}

#[test]
fn zero_length_interval_is_passed_through() {
    let plan = resolver_with(vec![custom_session("s", &[60, 0, 30])])
        .resolve(Technique::Custom, Some("s"))
        .unwrap();
    let mut runtime = TimerRuntime::new(plan);
    runtime.start();
    tick_n(&mut runtime, 59);

    let events = runtime.tick();
    assert_eq!(runtime.interval_index(), 2);
    assert_eq!(runtime.remaining_secs(), 30);
    let started: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::IntervalStarted { interval_index, .. } => Some(*interval_index),
            _ => None,
        })
        .collect();
    assert_eq!(started, [1, 2]);
}

#[test]
fn progress_hits_zero_and_one() {
    let plan = resolver_with(vec![custom_session("p", &[4, 6])])
        .resolve(Technique::Custom, Some("p"))
        .unwrap();
    let mut runtime = TimerRuntime::new(plan);
    assert_eq!(runtime.progress(), 0.0);
    runtime.start();
    tick_n(&mut runtime, 3);
    assert_eq!(runtime.progress(), 0.75);

    // The emptying tick moves on to the next interval, which starts at 0.
    let events = runtime.tick();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::IntervalCompleted { interval_index: 0, .. })));
    assert_eq!(progress_fraction(4, 0), 1.0);
    assert_eq!(runtime.progress(), 0.0);
}

#[test]
fn pause_does_not_catch_up() {
    let plan = resolver_with(vec![])
        .resolve(Technique::Flowtime, None)
        .unwrap();
    let mut runtime = TimerRuntime::new(plan);
    runtime.start();
    tick_n(&mut runtime, 100);
    runtime.pause();
    tick_n(&mut runtime, 10_000);
    runtime.start();
    assert_eq!(runtime.remaining_secs(), 2700 - 100);
    assert_eq!(runtime.state(), TimerState::Running);
}

#[test]
fn unknown_custom_session_fails_before_runtime_exists() {
    let err = resolver_with(vec![])
        .resolve(Technique::Custom, Some("gone"))
        .unwrap_err();
    assert!(matches!(err, CoreError::SessionNotFound { .. }));
}

#[test]
fn finish_from_paused_syncs_subtasks_exactly_once() {
    let tasks = Arc::new(MemoryTaskStore::new());
    tasks.insert(Task {
        id: "essay".into(),
        title: "Essay".into(),
        subtasks: ["outline", "draft", "edit"]
            .into_iter()
            .map(|id| Subtask {
                id: id.into(),
                title: id.into(),
                completed: false,
                priority: Priority::Medium,
            })
            .collect(),
    })
    .unwrap();

    let plan = resolver_with(vec![])
        .resolve(Technique::Pomodoro, None)
        .unwrap();
    let mut focus = FocusSession::new(TimerRuntime::new(plan), Some("essay".into()), tasks.clone());
    focus.start();
    focus.tick();
    focus.mark_subtask("outline", true);
    focus.mark_subtask("draft", true);
    focus.pause();

    let first = focus.finish();
    let second = focus.finish();
    assert!(first.finished());
    assert!(!second.finished());
    assert_eq!(focus.state(), TimerState::Finished);

    let calls = tasks.calls().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.completed && c.task_id == "essay"));
    assert_eq!(tasks.task("essay").unwrap().unwrap().completed_count(), 2);
}
