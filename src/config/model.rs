// src/config/model.rs

use serde::Deserialize;

use crate::catalog::{Payload, SequenceDefinition};
use crate::types::PublisherKind;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// namespace = "paragon"
///
/// [publisher]
/// kind = "shell"
/// cmd = "mosquitto_pub -q 2 -t \"$EFFECTS_TOPIC\" -m \"$EFFECTS_PAYLOAD\""
///
/// [[sequence]]
/// id = "clockwork-aether-raise-newel"
/// puzzle_id = "clockwork-crank"
/// room_id = "clockwork"
///
/// [[sequence.step]]
/// order = 1
/// action = "raise-newel-post"
/// payload = { command = "raiseNewelPost", speed = 1000 }
/// ```
///
/// Sequences are an array of tables so that registration order follows
/// declaration order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub publisher: PublisherSection,

    #[serde(default)]
    pub sequence: Vec<SequenceConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub publisher: PublisherSection,
    pub sequence: Vec<SequenceConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        publisher: PublisherSection,
        sequence: Vec<SequenceConfig>,
    ) -> Self {
        Self {
            config,
            publisher,
            sequence,
        }
    }

    /// Convert every `[[sequence]]` into an engine-ready definition.
    pub fn definitions(&self) -> Vec<SequenceDefinition> {
        self.sequence
            .iter()
            .cloned()
            .map(SequenceDefinition::from)
            .collect()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// First segment of every resolved topic.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Capacity of the lifecycle event broadcast channel.
    ///
    /// Subscribers that fall further behind than this lose the oldest events.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// How many executions the tracker keeps before evicting the oldest
    /// finished ones. `0` keeps everything for the process lifetime.
    #[serde(default = "default_max_retained_executions")]
    pub max_retained_executions: usize,
}

fn default_namespace() -> String {
    "paragon".to_string()
}

fn default_event_buffer() -> usize {
    256
}

fn default_max_retained_executions() -> usize {
    1000
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            event_buffer: default_event_buffer(),
            max_retained_executions: default_max_retained_executions(),
        }
    }
}

/// `[publisher]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PublisherSection {
    #[serde(default)]
    pub kind: PublisherKind,

    /// Shell command run once per published command (`kind = "shell"`).
    ///
    /// `EFFECTS_TOPIC` and `EFFECTS_PAYLOAD` are set in its environment.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Per-publish timeout for the shell publisher.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// One `[[sequence]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceConfig {
    pub id: String,

    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,

    pub puzzle_id: String,

    pub room_id: String,

    #[serde(default)]
    pub duration_ms: u64,

    /// The `[[sequence.step]]` entries, in declaration order.
    #[serde(default)]
    pub step: Vec<StepConfig>,
}

/// One `[[sequence.step]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    #[serde(default)]
    pub order: u32,

    #[serde(default)]
    pub offset_ms: u64,

    pub action: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub topic: Option<String>,

    #[serde(default)]
    pub payload: Option<Payload>,
}
