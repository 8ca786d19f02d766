// src/catalog/registry.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::definition::SequenceDefinition;

/// Keyed store of sequence definitions.
///
/// Registration happens once at startup, before the engine accepts any
/// trigger; afterwards the registry is only read, so it needs no locking of
/// its own.
///
/// Registering an id that already exists replaces the earlier definition
/// (last write wins). The replacement keeps the list position of the first
/// registration.
#[derive(Debug, Default)]
pub struct SequenceRegistry {
    by_id: HashMap<String, usize>,
    entries: Vec<Arc<SequenceDefinition>>,
}

impl SequenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: SequenceDefinition) {
        let id = definition.id.clone();
        let steps = definition.steps.len();
        let definition = Arc::new(definition);

        match self.by_id.get(&id) {
            Some(&idx) => {
                warn!(sequence = %id, steps, "sequence id registered twice; replacing earlier definition");
                self.entries[idx] = definition;
            }
            None => {
                self.by_id.insert(id.clone(), self.entries.len());
                self.entries.push(definition);
                info!(sequence = %id, steps, "registered sequence");
            }
        }
    }

    pub fn register_many(&mut self, definitions: impl IntoIterator<Item = SequenceDefinition>) {
        for def in definitions {
            self.register(def);
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<SequenceDefinition>> {
        self.by_id.get(id).map(|&idx| Arc::clone(&self.entries[idx]))
    }

    /// All definitions, in registration order.
    pub fn list(&self) -> Vec<Arc<SequenceDefinition>> {
        self.entries.clone()
    }

    pub fn list_by_room(&self, room_id: &str) -> Vec<Arc<SequenceDefinition>> {
        self.entries
            .iter()
            .filter(|def| def.room_id == room_id)
            .cloned()
            .collect()
    }

    pub fn list_by_puzzle(&self, puzzle_id: &str) -> Vec<Arc<SequenceDefinition>> {
        self.entries
            .iter()
            .filter(|def| def.puzzle_id == puzzle_id)
            .cloned()
            .collect()
    }

    /// Number of sequences per room id.
    pub fn count_by_room(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for def in &self.entries {
            *counts.entry(def.room_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<SequenceDefinition> for SequenceRegistry {
    fn from_iter<I: IntoIterator<Item = SequenceDefinition>>(iter: I) -> Self {
        let mut registry = SequenceRegistry::new();
        registry.register_many(iter);
        registry
    }
}
