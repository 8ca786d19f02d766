// src/engine/executor.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::catalog::{Payload, SequenceDefinition, SequenceRegistry, Step};
use crate::config::ConfigSection;
use crate::errors::{EffectsError, Result};
use crate::publish::CommandPublisher;
use crate::types::ExecutionStatus;

use super::destination::resolve_destination;
use super::events::{EventBus, SequenceEvent};
use super::plan::plan_steps;
use super::tracker::ExecutionTracker;
use super::{ContextOverride, Execution, ExecutionId, TriggerContext};

/// Engine settings, normally taken from the `[config]` section.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// First topic segment for resolved destinations.
    pub namespace: String,
    /// Broadcast capacity of the event bus.
    pub event_buffer: usize,
    /// See [`ExecutionTracker`]; `0` keeps every execution.
    pub max_retained_executions: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        ConfigSection::default().into()
    }
}

impl From<ConfigSection> for EngineOptions {
    fn from(cfg: ConfigSection) -> Self {
        Self {
            namespace: cfg.namespace,
            event_buffer: cfg.event_buffer,
            max_retained_executions: cfg.max_retained_executions,
        }
    }
}

/// Sequence counts for [`EngineSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceCounts {
    pub total: usize,
    pub by_room: BTreeMap<String, usize>,
}

/// Execution counts for [`EngineSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionCounts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Health snapshot of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineSummary {
    pub sequences: SequenceCounts,
    pub executions: ExecutionCounts,
}

struct EngineInner {
    registry: SequenceRegistry,
    tracker: ExecutionTracker,
    publisher: Arc<dyn CommandPublisher>,
    events: EventBus,
    namespace: String,
}

/// Runs sequences: one Tokio task per execution, steps strictly sequential
/// within an execution, executions independent of each other.
///
/// Cheap to clone; all clones share the same registry, tracker and event bus.
/// `trigger` and `execute` must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct SequenceEngine {
    inner: Arc<EngineInner>,
}

impl fmt::Debug for SequenceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceEngine")
            .field("namespace", &self.inner.namespace)
            .field("sequences", &self.inner.registry.len())
            .field("executions", &self.inner.tracker.len())
            .finish_non_exhaustive()
    }
}

impl SequenceEngine {
    /// Take ownership of a fully populated registry. No sequence can be added
    /// afterwards.
    pub fn new(
        registry: SequenceRegistry,
        publisher: Arc<dyn CommandPublisher>,
        options: EngineOptions,
    ) -> Self {
        let inner = EngineInner {
            registry,
            tracker: ExecutionTracker::new(options.max_retained_executions),
            publisher,
            events: EventBus::new(options.event_buffer),
            namespace: options.namespace,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Look up `sequence_id` and start it.
    ///
    /// Fails with [`EffectsError::SequenceNotFound`] (and creates nothing) if
    /// the id is unknown. Otherwise returns as soon as the execution is
    /// registered; see [`SequenceEngine::execute`].
    pub fn trigger(&self, sequence_id: &str, overrides: ContextOverride) -> Result<ExecutionId> {
        let definition = self
            .inner
            .registry
            .get(sequence_id)
            .ok_or_else(|| EffectsError::SequenceNotFound(sequence_id.to_string()))?;

        let context = TriggerContext::for_definition(&definition, overrides);
        Ok(self.execute(definition, context))
    }

    /// Start `definition` with `context` and return its execution id
    /// immediately.
    ///
    /// The execution is in the tracker (status `Running`) and the `Started`
    /// event has been emitted before this returns. Completion is reported only
    /// through the tracker and the event bus.
    pub fn execute(
        &self,
        definition: Arc<SequenceDefinition>,
        context: TriggerContext,
    ) -> ExecutionId {
        let execution = self.inner.tracker.create(&definition, context);
        let id = execution.id.clone();

        info!(
            execution = %id,
            sequence = %definition.id,
            puzzle = %execution.context.puzzle_id,
            "starting sequence execution"
        );
        self.inner.events.emit(SequenceEvent::Started { execution });

        let inner = Arc::clone(&self.inner);
        let run_id = id.clone();
        tokio::spawn(async move {
            inner.drive(run_id, definition).await;
        });

        id
    }

    pub fn execution(&self, id: &str) -> Result<Execution> {
        self.inner
            .tracker
            .get(id)
            .ok_or_else(|| EffectsError::ExecutionNotFound(id.to_string()))
    }

    /// All tracked executions, oldest first.
    pub fn executions(&self) -> Vec<Execution> {
        self.inner.tracker.list()
    }

    pub fn active_executions(&self) -> Vec<Execution> {
        self.inner.tracker.list_active()
    }

    pub fn sequence(&self, id: &str) -> Result<Arc<SequenceDefinition>> {
        self.inner
            .registry
            .get(id)
            .ok_or_else(|| EffectsError::SequenceNotFound(id.to_string()))
    }

    /// The catalog, in registration order.
    pub fn sequences(&self) -> Vec<Arc<SequenceDefinition>> {
        self.inner.registry.list()
    }

    pub fn sequences_by_room(&self, room_id: &str) -> Vec<Arc<SequenceDefinition>> {
        self.inner.registry.list_by_room(room_id)
    }

    pub fn sequences_by_puzzle(&self, puzzle_id: &str) -> Vec<Arc<SequenceDefinition>> {
        self.inner.registry.list_by_puzzle(puzzle_id)
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequenceEvent> {
        self.inner.events.subscribe()
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Wait until execution `id` reaches a terminal state and return it.
    pub async fn wait_for(&self, id: &str) -> Result<Execution> {
        // Subscribe before checking so a transition between the two is not lost.
        let mut rx = self.subscribe();

        loop {
            let current = self.execution(id)?;
            if current.status.is_terminal() {
                return Ok(current);
            }

            match rx.recv().await {
                Ok(event) if event.is_terminal() && event.execution().id == id => {
                    return Ok(event.execution().clone());
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(EffectsError::Other(anyhow::anyhow!(
                        "event bus closed while waiting for execution {id}"
                    )));
                }
            }
        }
    }

    /// Wait until no execution is running.
    pub async fn wait_idle(&self) {
        let mut rx = self.subscribe();

        while !self.inner.tracker.list_active().is_empty() {
            if let Err(broadcast::error::RecvError::Closed) = rx.recv().await {
                return;
            }
        }
    }

    pub fn summary(&self) -> EngineSummary {
        let executions = self.inner.tracker.list();
        let count = |status: ExecutionStatus| executions.iter().filter(|e| e.status == status).count();

        EngineSummary {
            sequences: SequenceCounts {
                total: self.inner.registry.len(),
                by_room: self.inner.registry.count_by_room(),
            },
            executions: ExecutionCounts {
                total: executions.len(),
                active: count(ExecutionStatus::Running),
                completed: count(ExecutionStatus::Completed),
                failed: count(ExecutionStatus::Failed),
            },
        }
    }
}

impl EngineInner {
    /// Drive one execution to a terminal state.
    async fn drive(&self, id: ExecutionId, definition: Arc<SequenceDefinition>) {
        let Some(context) = self.tracker.get(&id).map(|e| e.context) else {
            warn!(execution = %id, "execution vanished from tracker before its first step");
            return;
        };

        let plan = plan_steps(&definition.steps);

        for (idx, planned) in plan.iter().enumerate() {
            let Some(snapshot) = self.tracker.update(&id, |e| e.current_step = idx + 1) else {
                warn!(execution = %id, "execution vanished from tracker mid-run");
                return;
            };

            self.events.emit(SequenceEvent::Step {
                execution: snapshot,
                step: planned.step.clone(),
            });

            if let Err(err) = self.run_step(&planned.step, &context).await {
                self.finish(&id, Err(err.to_string()));
                return;
            }

            if !planned.delay_after.is_zero() {
                debug!(execution = %id, delay_ms = planned.delay_after.as_millis() as u64, "waiting for next step");
                tokio::time::sleep(planned.delay_after).await;
            }
        }

        self.finish(&id, Ok(()));
    }

    /// Resolve and publish one step.
    ///
    /// The publish runs on its own task so that a panicking publisher fails
    /// this execution instead of leaving it `Running` forever.
    async fn run_step(&self, step: &Step, context: &TriggerContext) -> Result<()> {
        let destination = resolve_destination(&self.namespace, step, context)?;
        let payload = step
            .payload
            .clone()
            .unwrap_or_else(|| default_payload(&step.action));

        debug!(action = %step.action, %destination, "publishing step command");

        let publisher = Arc::clone(&self.publisher);
        let target = destination.clone();
        let handle =
            tokio::spawn(async move { publisher.publish(&target, &payload).await });

        match handle.await {
            Ok(result) => result,
            Err(join_err) => Err(EffectsError::PublishFailed {
                destination,
                reason: format!("publisher task aborted: {join_err}"),
            }),
        }
    }

    fn finish(&self, id: &str, outcome: std::result::Result<(), String>) {
        let status = if outcome.is_ok() {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };
        let cause = outcome.err();

        let updated = self.tracker.update(id, |e| {
            e.status = status;
            e.completed_at = Some(Utc::now());
            e.error = cause.clone();
        });

        let Some(execution) = updated else {
            warn!(execution = %id, "execution vanished from tracker before it finished");
            return;
        };

        match cause {
            None => self.events.emit(SequenceEvent::Completed { execution }),
            Some(cause) => self.events.emit(SequenceEvent::Failed { execution, cause }),
        }
    }
}

/// Payload used when a step declares none: `{"command": <action>, "timestamp": <unix ms>}`.
pub fn default_payload(action: &str) -> Payload {
    let mut payload = Payload::new();
    payload.insert("command".to_string(), action.into());
    payload.insert("timestamp".to_string(), Utc::now().timestamp_millis().into());
    payload
}
