// src/engine/events.rs

//! Lifecycle notifications.
//!
//! The engine emits one [`SequenceEvent`] per milestone onto an [`EventBus`]
//! (a `tokio::sync::broadcast` channel). Emitting never blocks: every
//! subscriber has its own position in the ring buffer, sees events in
//! emission order, and a subscriber that falls more than `capacity` events
//! behind skips the oldest ones (`RecvError::Lagged`) instead of stalling the
//! engine.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::catalog::Step;

use super::Execution;

/// A lifecycle milestone of one execution.
///
/// Every variant carries a snapshot of the execution taken at emission time.
#[derive(Debug, Clone)]
pub enum SequenceEvent {
    Started { execution: Execution },
    /// The step about to be published. `execution.current_step` is already
    /// its 1-based position.
    Step { execution: Execution, step: Step },
    Completed { execution: Execution },
    Failed { execution: Execution, cause: String },
}

impl SequenceEvent {
    pub fn execution(&self) -> &Execution {
        match self {
            SequenceEvent::Started { execution }
            | SequenceEvent::Step { execution, .. }
            | SequenceEvent::Completed { execution }
            | SequenceEvent::Failed { execution, .. } => execution,
        }
    }

    /// Short lower-case name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SequenceEvent::Started { .. } => "started",
            SequenceEvent::Step { .. } => "step",
            SequenceEvent::Completed { .. } => "completed",
            SequenceEvent::Failed { .. } => "failed",
        }
    }

    /// `true` for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SequenceEvent::Completed { .. } | SequenceEvent::Failed { .. }
        )
    }
}

/// Broadcast channel for [`SequenceEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SequenceEvent>,
}

impl EventBus {
    /// `capacity` must be at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Fire-and-forget. Having no subscribers is not an error.
    pub fn emit(&self, event: SequenceEvent) {
        let kind = event.kind();
        if self.tx.send(event).is_err() {
            debug!(kind, "no event subscribers; dropping event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequenceEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Something that wants to react to lifecycle events.
///
/// Observers run on their own task (see [`spawn_observer`]); they can be slow
/// or panic without affecting any execution.
pub trait SequenceObserver: Send + 'static {
    fn on_event(&mut self, event: &SequenceEvent);
}

/// Subscribe `observer` to `bus` and feed it every event on a dedicated task.
///
/// The task ends when the bus is dropped. A panic inside `on_event` is caught
/// and logged; the observer keeps receiving subsequent events.
pub fn spawn_observer<O: SequenceObserver>(bus: &EventBus, mut observer: O) -> JoinHandle<()> {
    let mut rx = bus.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let outcome = catch_unwind(AssertUnwindSafe(|| observer.on_event(&event)));
                    if outcome.is_err() {
                        error!(
                            kind = event.kind(),
                            execution = %event.execution().id,
                            "event observer panicked; continuing with next event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event observer lagged behind; events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("event observer finished (bus closed)");
    })
}

/// Logs every lifecycle event through `tracing`.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl SequenceObserver for LoggingObserver {
    fn on_event(&mut self, event: &SequenceEvent) {
        match event {
            SequenceEvent::Started { execution } => {
                info!(
                    execution = %execution.id,
                    sequence = %execution.sequence_id,
                    puzzle = %execution.context.puzzle_id,
                    room = %execution.context.room_id,
                    steps = execution.total_steps,
                    "sequence started"
                );
            }
            SequenceEvent::Step { execution, step } => {
                debug!(
                    execution = %execution.id,
                    step = execution.current_step,
                    total = execution.total_steps,
                    action = %step.action,
                    offset_ms = step.offset_ms,
                    "executing step"
                );
            }
            SequenceEvent::Completed { execution } => {
                let duration_ms = execution.duration().map(|d| d.num_milliseconds());
                info!(
                    execution = %execution.id,
                    sequence = %execution.sequence_id,
                    ?duration_ms,
                    "sequence completed"
                );
            }
            SequenceEvent::Failed { execution, cause } => {
                error!(
                    execution = %execution.id,
                    sequence = %execution.sequence_id,
                    step = execution.current_step,
                    total = execution.total_steps,
                    %cause,
                    "sequence failed"
                );
            }
        }
    }
}
