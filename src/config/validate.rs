// src/config/validate.rs

use std::collections::HashSet;

use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile, SequenceConfig};
use crate::errors::{EffectsError, Result};
use crate::types::PublisherKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = EffectsError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.publisher, raw.sequence))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_publisher(cfg)?;
    for seq in &cfg.sequence {
        validate_sequence(seq)?;
    }
    warn_duplicate_ids(cfg);
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.namespace.trim().is_empty() {
        return Err(EffectsError::ConfigError(
            "[config].namespace must not be empty".to_string(),
        ));
    }

    if cfg.config.event_buffer == 0 {
        return Err(EffectsError::ConfigError(
            "[config].event_buffer must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_publisher(cfg: &RawConfigFile) -> Result<()> {
    if cfg.publisher.kind == PublisherKind::Shell {
        let has_cmd = cfg
            .publisher
            .cmd
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if !has_cmd {
            return Err(EffectsError::ConfigError(
                "[publisher] kind = \"shell\" requires a non-empty `cmd`".to_string(),
            ));
        }
    }

    if cfg.publisher.timeout_ms == Some(0) {
        return Err(EffectsError::ConfigError(
            "[publisher].timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_sequence(seq: &SequenceConfig) -> Result<()> {
    if seq.id.trim().is_empty() {
        return Err(EffectsError::ConfigError(
            "every [[sequence]] needs a non-empty `id`".to_string(),
        ));
    }

    for (field, value) in [("room_id", &seq.room_id), ("puzzle_id", &seq.puzzle_id)] {
        if value.trim().is_empty() {
            return Err(EffectsError::ConfigError(format!(
                "sequence '{}' has an empty `{}`",
                seq.id, field
            )));
        }
    }

    if seq.step.is_empty() {
        return Err(EffectsError::ConfigError(format!(
            "sequence '{}' must contain at least one [[sequence.step]]",
            seq.id
        )));
    }

    for (idx, step) in seq.step.iter().enumerate() {
        if step.action.trim().is_empty() {
            return Err(EffectsError::ConfigError(format!(
                "sequence '{}' step #{} has an empty `action`",
                seq.id,
                idx + 1
            )));
        }
    }

    Ok(())
}

/// Duplicate ids are legal: the later definition replaces the earlier one
/// at registration.
fn warn_duplicate_ids(cfg: &RawConfigFile) {
    let mut seen = HashSet::new();
    for seq in &cfg.sequence {
        if !seen.insert(seq.id.as_str()) {
            warn!(sequence = %seq.id, "duplicate sequence id in config; the later definition wins");
        }
    }
}
