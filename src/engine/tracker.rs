// src/engine/tracker.rs

//! Table of live and finished executions.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::debug;

use crate::catalog::SequenceDefinition;
use crate::types::ExecutionStatus;

use super::{Execution, ExecutionId, TriggerContext};

#[derive(Debug, Default)]
struct Table {
    /// Insertion order.
    order: VecDeque<ExecutionId>,
    entries: HashMap<ExecutionId, Execution>,
}

/// Concurrent-safe store of executions, owned by the engine.
///
/// Each execution has a single writer (the task driving it) and any number of
/// readers. Readers always get a cloned snapshot, so a reader never observes
/// a half-applied update.
///
/// Retention: once the table holds more than `max_retained` executions, the
/// oldest *finished* ones are evicted. Running executions are never evicted.
/// `max_retained == 0` disables eviction.
#[derive(Debug)]
pub struct ExecutionTracker {
    table: RwLock<Table>,
    counter: AtomicU64,
    max_retained: usize,
}

impl ExecutionTracker {
    pub fn new(max_retained: usize) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            counter: AtomicU64::new(0),
            max_retained,
        }
    }

    /// Create a `Running` execution for `definition` and insert it.
    pub fn create(&self, definition: &SequenceDefinition, context: TriggerContext) -> Execution {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Utc::now();
        let execution = Execution {
            id: format!("exec-{}-{}", seq, now.timestamp_millis()),
            sequence_id: definition.id.clone(),
            status: ExecutionStatus::Running,
            started_at: now,
            completed_at: None,
            current_step: 0,
            total_steps: definition.steps.len(),
            context,
            error: None,
        };

        let mut table = self.write();
        table.order.push_back(execution.id.clone());
        table.entries.insert(execution.id.clone(), execution.clone());
        self.evict_finished(&mut table);

        execution
    }

    pub fn get(&self, id: &str) -> Option<Execution> {
        self.read().entries.get(id).cloned()
    }

    /// All tracked executions, oldest first.
    pub fn list(&self) -> Vec<Execution> {
        let table = self.read();
        table
            .order
            .iter()
            .filter_map(|id| table.entries.get(id).cloned())
            .collect()
    }

    /// Executions still `Running`, oldest first.
    pub fn list_active(&self) -> Vec<Execution> {
        let table = self.read();
        table
            .order
            .iter()
            .filter_map(|id| table.entries.get(id))
            .filter(|exec| exec.is_running())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply `f` to the execution `id` and return the updated snapshot.
    ///
    /// Returns `None` if the id is unknown.
    pub fn update(&self, id: &str, f: impl FnOnce(&mut Execution)) -> Option<Execution> {
        let mut table = self.write();
        let execution = table.entries.get_mut(id)?;
        f(execution);
        let snapshot = execution.clone();
        if snapshot.status.is_terminal() {
            self.evict_finished(&mut table);
        }
        Some(snapshot)
    }

    fn evict_finished(&self, table: &mut Table) {
        if self.max_retained == 0 || table.entries.len() <= self.max_retained {
            return;
        }

        let mut excess = table.entries.len() - self.max_retained;
        let Table { order, entries } = table;
        order.retain(|id| {
            if excess == 0 {
                return true;
            }
            let finished = entries
                .get(id)
                .is_some_and(|exec| exec.status.is_terminal());
            if finished {
                entries.remove(id);
                excess -= 1;
                debug!(execution = %id, "evicted finished execution from tracker");
                false
            } else {
                true
            }
        });
    }

    // A panic while holding the lock cannot leave a half-written `Execution`
    // behind (updates are whole-field assignments), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ExecutionTracker {
    fn default() -> Self {
        Self::new(0)
    }
}
