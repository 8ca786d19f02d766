// src/catalog/definition.rs

//! Immutable sequence templates.

use serde::Serialize;

use crate::config::model::{SequenceConfig, StepConfig};

/// Opaque command payload, passed to the publisher verbatim.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One command within a sequence, fired at `offset_ms` after sequence start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Declared position; breaks ties between steps with equal offsets.
    pub order: u32,
    /// Offset from sequence start in milliseconds.
    pub offset_ms: u64,
    /// Effect / command identifier, e.g. `clockwork-pilotlight-led-fire-animation`.
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Explicit destination topic. When set, action-based resolution is skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl Step {
    pub fn new(order: u32, offset_ms: u64, action: impl Into<String>) -> Self {
        Self {
            order,
            offset_ms,
            action: action.into(),
            description: None,
            topic: None,
            payload: None,
        }
    }
}

impl From<StepConfig> for Step {
    fn from(cfg: StepConfig) -> Self {
        Self {
            order: cfg.order,
            offset_ms: cfg.offset_ms,
            action: cfg.action,
            description: cfg.description,
            topic: cfg.topic,
            payload: cfg.payload,
        }
    }
}

/// A named, ordered set of timed steps owned by one puzzle in one room.
///
/// Never mutated after it is registered; the engine shares it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceDefinition {
    pub id: String,
    pub name: String,
    pub puzzle_id: String,
    pub room_id: String,
    /// Nominal duration, informational only.
    pub duration_ms: u64,
    pub steps: Vec<Step>,
}

impl From<SequenceConfig> for SequenceDefinition {
    fn from(cfg: SequenceConfig) -> Self {
        let name = cfg.name.unwrap_or_else(|| cfg.id.clone());
        Self {
            id: cfg.id,
            name,
            puzzle_id: cfg.puzzle_id,
            room_id: cfg.room_id,
            duration_ms: cfg.duration_ms,
            steps: cfg.step.into_iter().map(Step::from).collect(),
        }
    }
}
