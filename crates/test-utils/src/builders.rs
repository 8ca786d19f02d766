#![allow(dead_code)]

use std::sync::Arc;

use effects_controller::catalog::{Payload, SequenceDefinition, SequenceRegistry, Step};
use effects_controller::engine::{EngineOptions, SequenceEngine};
use effects_controller::publish::CommandPublisher;
use serde_json::Value;

/// Builder for `SequenceDefinition` to simplify test setup.
///
/// Defaults: room `clockwork`, puzzle `clockwork-pilotlight`, no steps.
pub struct SequenceBuilder {
    def: SequenceDefinition,
}

impl SequenceBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            def: SequenceDefinition {
                id: id.to_string(),
                name: id.to_string(),
                puzzle_id: "clockwork-pilotlight".to_string(),
                room_id: "clockwork".to_string(),
                duration_ms: 0,
                steps: Vec::new(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.def.name = name.to_string();
        self
    }

    pub fn room(mut self, room_id: &str) -> Self {
        self.def.room_id = room_id.to_string();
        self
    }

    pub fn puzzle(mut self, puzzle_id: &str) -> Self {
        self.def.puzzle_id = puzzle_id.to_string();
        self
    }

    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.def.duration_ms = ms;
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.def.steps.push(step);
        self
    }

    /// Append a step whose `order` is its declaration position (1-based).
    pub fn action_at(mut self, offset_ms: u64, action: &str) -> Self {
        let order = self.def.steps.len() as u32 + 1;
        self.def.steps.push(Step::new(order, offset_ms, action));
        self
    }

    pub fn build(self) -> SequenceDefinition {
        self.def
    }
}

/// Builder for `Step`.
pub struct StepBuilder {
    step: Step,
}

impl StepBuilder {
    pub fn new(order: u32, action: &str) -> Self {
        Self {
            step: Step::new(order, 0, action),
        }
    }

    pub fn offset_ms(mut self, ms: u64) -> Self {
        self.step.offset_ms = ms;
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.step.description = Some(text.to_string());
        self
    }

    pub fn topic(mut self, topic: &str) -> Self {
        self.step.topic = Some(topic.to_string());
        self
    }

    pub fn payload_entry(mut self, key: &str, value: Value) -> Self {
        self.step
            .payload
            .get_or_insert_with(Payload::new)
            .insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Step {
        self.step
    }
}

/// Engine over `definitions` with default options.
pub fn engine_with(
    definitions: Vec<SequenceDefinition>,
    publisher: Arc<dyn CommandPublisher>,
) -> SequenceEngine {
    let registry: SequenceRegistry = definitions.into_iter().collect();
    SequenceEngine::new(registry, publisher, EngineOptions::default())
}
