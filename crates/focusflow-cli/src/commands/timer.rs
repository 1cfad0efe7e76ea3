use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use focusflow_core::{
    drive, Config, Database, Event, FocusRecord, FocusSession, SessionPlan, SessionResolver,
    StoreError, Technique, TickSource, TimerRuntime,
};
use tracing::info;

use super::print_event;

#[derive(Args)]
pub struct PlanArgs {
    /// pomodoro, timeboxing, flowtime or custom
    technique: Technique,
    /// Custom session id (required for `custom`)
    #[arg(long)]
    session: Option<String>,
}

#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    plan: PlanArgs,
    /// Number of one-second ticks to apply
    #[arg(long)]
    ticks: u64,
    /// Pause after this tick, then resume
    #[arg(long)]
    pause_after: Option<u64>,
    /// Ticks delivered while paused (they are ignored)
    #[arg(long, requires = "pause_after")]
    missed: Option<u64>,
    /// Reset after this tick, then start again
    #[arg(long)]
    reset_after: Option<u64>,
    /// Finish the session after the last tick
    #[arg(long)]
    finish: bool,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    plan: PlanArgs,
    /// Task the session works on
    #[arg(long)]
    task: Option<String>,
    /// Subtask completed during the session (repeatable)
    #[arg(long = "complete", requires = "task")]
    completed: Vec<String>,
    /// Stop after this many ticks instead of waiting for Ctrl-C
    #[arg(long)]
    max_ticks: Option<u64>,
}

fn resolve(
    args: &PlanArgs,
    db: Arc<Database>,
    config: &Config,
) -> Result<SessionPlan, Box<dyn std::error::Error>> {
    let plan = SessionResolver::new(db)
        .with_durations(config.technique_table())
        .resolve(args.technique, args.session.as_deref())?;
    Ok(plan)
}

pub fn plan(args: PlanArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open()?);
    let plan = resolve(&args, db, config)?;
    let json = serde_json::json!({
        "plan": plan,
        "total_secs": plan.total_duration_secs(),
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

pub fn simulate(args: SimulateArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open()?);
    let mut runtime = TimerRuntime::new(resolve(&args.plan, db, config)?);

    let emit = |event: Option<Event>| {
        if let Some(event) = event {
            print_event(&event);
        }
    };
    let emit_all = |events: Vec<Event>| events.iter().for_each(print_event);

    emit(runtime.start());
    for step in 1..=args.ticks {
        emit_all(runtime.tick());
        if args.pause_after == Some(step) {
            emit(runtime.pause());
            for _ in 0..args.missed.unwrap_or(0) {
                emit_all(runtime.tick());
            }
            emit(runtime.start());
        }
        if args.reset_after == Some(step) {
            emit(runtime.reset());
            emit(runtime.start());
        }
    }
    if args.finish {
        emit(runtime.finish());
    }
    print_event(&runtime.snapshot_event());
    Ok(())
}

pub fn run(args: RunArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open()?);
    let plan = resolve(&args.plan, db.clone(), config)?;

    if let Some(task_id) = &args.task {
        if db.get_task(task_id)?.is_none() {
            return Err(StoreError::NotFound {
                kind: "task",
                id: task_id.clone(),
            }
            .into());
        }
    }

    let mut focus = FocusSession::new(TimerRuntime::new(plan), args.task.clone(), db.clone());
    for subtask_id in &args.completed {
        focus.mark_subtask(subtask_id.as_str(), true);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let exit = rt.block_on(async {
        let (mut source, mut ticks) = TickSource::spawn(config.tick_period());
        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        drive(
            &mut focus,
            &mut source,
            &mut ticks,
            shutdown,
            args.max_ticks,
            print_event,
        )
        .await
    });
    info!(?exit, "tick loop stopped");

    let report = focus.finish();
    for event in &report.events {
        print_event(event);
    }

    let runtime = focus.runtime();
    db.record_focus(&FocusRecord {
        id: None,
        technique: runtime.plan().technique,
        session_name: runtime.plan().name.clone(),
        task_id: focus.task_id().map(String::from),
        total_elapsed_secs: runtime.total_elapsed_secs(),
        cycle_count: runtime.cycle_count(),
        subtasks_completed: u32::try_from(report.synced.len()).unwrap_or(u32::MAX),
        finished_at: Utc::now(),
    })?;
    print_event(&runtime.snapshot_event());
    Ok(())
}
