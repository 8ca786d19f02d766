use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one execution.
///
/// An execution is created directly in `Running`; there is no observable
/// pending state. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Which transport adapter the binary publishes commands through.
///
/// - `Stdout`: print `<topic> <payload>` lines (default, useful for piping).
/// - `Shell`: run a configured shell command per command, e.g. `mosquitto_pub`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublisherKind {
    Stdout,
    Shell,
}

impl Default for PublisherKind {
    fn default() -> Self {
        PublisherKind::Stdout
    }
}
