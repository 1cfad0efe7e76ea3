//! Periodic tick source for driving a [`FocusSession`] in real time.
//!
//! One tokio task per source. Ticks travel over a channel of capacity 1 to a
//! single consumer, so at most one tick is ever in flight and the runtime is
//! never ticked re-entrantly. Pausing gates delivery without stopping the
//! task; `cancel()` (or dropping the source) aborts it, which closes the
//! channel.
//!
//! Missed ticks are not replayed: after a suspension the next tick simply
//! arrives one period later.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::events::Event;
use crate::focus::FocusSession;

/// One delivered tick. `seq` counts delivered ticks from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub seq: u64,
}

pub struct TickSource {
    active: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl TickSource {
    /// Spawn an inactive source. Must be called inside a tokio runtime.
    pub fn spawn(period: Duration) -> (Self, mpsc::Receiver<Tick>) {
        let (tx, rx) = mpsc::channel(1);
        let (active_tx, mut active_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seq = 0u64;
            loop {
                let active = *active_rx.borrow_and_update();
                if !active {
                    if active_rx.changed().await.is_err() {
                        return;
                    }
                    interval.reset();
                    continue;
                }
                interval.tick().await;
                if !*active_rx.borrow() {
                    continue;
                }
                seq += 1;
                if tx.send(Tick { seq }).await.is_err() {
                    return;
                }
            }
        });

        (
            Self {
                active: active_tx,
                handle: Some(handle),
            },
            rx,
        )
    }

    /// Gate delivery. Inactive sources keep their task alive.
    pub fn set_active(&self, active: bool) {
        self.active.send_replace(active);
    }

    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    /// Abort the task. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("tick source cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Why [`drive`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveExit {
    Shutdown,
    TickLimit,
    SourceClosed,
    /// The session left the running state.
    Stopped,
}

/// Apply ticks from `ticks` to `session` until `shutdown` resolves, `limit`
/// ticks have been applied, the session stops running, or the source closes.
/// The source is cancelled on every exit path.
pub async fn drive<S, F>(
    session: &mut FocusSession,
    source: &mut TickSource,
    ticks: &mut mpsc::Receiver<Tick>,
    shutdown: S,
    limit: Option<u64>,
    mut on_event: F,
) -> DriveExit
where
    S: Future<Output = ()>,
    F: FnMut(&Event),
{
    tokio::pin!(shutdown);
    if let Some(event) = session.start() {
        on_event(&event);
    }
    source.set_active(session.runtime().is_running());

    let mut applied = 0u64;
    let exit = loop {
        if limit.is_some_and(|max| applied >= max) {
            break DriveExit::TickLimit;
        }
        if !session.runtime().is_running() {
            break DriveExit::Stopped;
        }
        tokio::select! {
            _ = &mut shutdown => break DriveExit::Shutdown,
            tick = ticks.recv() => match tick {
                Some(_) => {
                    applied += 1;
                    for event in session.tick() {
                        on_event(&event);
                    }
                }
                None => break DriveExit::SourceClosed,
            },
        }
    };

    source.set_active(false);
    source.cancel();
    debug!(?exit, applied, "tick loop exited");
    exit
}
