// src/engine/mod.rs

//! Sequence execution engine.
//!
//! This module ties together:
//! - step planning (sort by offset, compute inter-step delays)
//! - destination resolution (action id + trigger context -> topic)
//! - the execution tracker (live and finished runs)
//! - the lifecycle event bus (started / step / completed / failed)
//! - the [`SequenceEngine`] itself, which drives one Tokio task per run.
//!
//! The pure parts ([`plan`], [`destination`]) have no Tokio types and are
//! tested without a runtime; [`executor`] is the async shell around them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::SequenceDefinition;
use crate::types::ExecutionStatus;

/// Canonical execution id type used throughout the engine.
///
/// Formatted as `exec-<counter>-<unix millis>`.
pub type ExecutionId = String;

/// Situational data that parameterises one run of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerContext {
    pub puzzle_id: String,
    pub room_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub triggered_at: DateTime<Utc>,
}

impl TriggerContext {
    pub fn new(puzzle_id: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            puzzle_id: puzzle_id.into(),
            room_id: room_id.into(),
            session_id: None,
            triggered_at: Utc::now(),
        }
    }

    /// Build the context for triggering `definition`, taking room/puzzle from
    /// `overrides` when given and from the definition otherwise.
    ///
    /// Blank override values count as not given.
    pub fn for_definition(definition: &SequenceDefinition, overrides: ContextOverride) -> Self {
        Self {
            puzzle_id: non_blank(overrides.puzzle_id)
                .unwrap_or_else(|| definition.puzzle_id.clone()),
            room_id: non_blank(overrides.room_id).unwrap_or_else(|| definition.room_id.clone()),
            session_id: non_blank(overrides.session_id),
            triggered_at: Utc::now(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Optional caller-supplied replacements for the trigger context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOverride {
    pub puzzle_id: Option<String>,
    pub room_id: Option<String>,
    pub session_id: Option<String>,
}

/// One live or finished run of a sequence.
///
/// Written only by the task driving it; everyone else sees cloned snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub sequence_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// 1-based index of the step most recently started; 0 before the first.
    pub current_step: usize,
    pub total_steps: usize,
    pub context: TriggerContext,
    /// Failure cause, set only when `status == Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Execution {
    pub fn is_running(&self) -> bool {
        self.status == ExecutionStatus::Running
    }

    /// Wall-clock run time, if the execution has finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|done| done - self.started_at)
    }
}

pub mod destination;
pub mod events;
pub mod executor;
pub mod plan;
pub mod tracker;

pub use destination::{capitalize, resolve_action_topic, resolve_destination};
pub use events::{spawn_observer, EventBus, LoggingObserver, SequenceEvent, SequenceObserver};
pub use executor::{EngineOptions, EngineSummary, ExecutionCounts, SequenceCounts, SequenceEngine};
pub use plan::{nominal_span, plan_steps, sort_steps, PlannedStep};
pub use tracker::ExecutionTracker;
