// src/logging.rs

//! Tracing subscriber for the binary.
//!
//! `--log-level` sets one global level. Without it, `EFFECTS_LOG` is read as
//! an `EnvFilter` directive list, so per-module levels work:
//!
//! ```text
//! EFFECTS_LOG=effects_controller::engine=debug,warn effects-controller --trigger vern-intro
//! ```
//!
//! Output goes to stderr. Stdout carries published commands and the summary.

use anyhow::Result;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "EFFECTS_LOG";

const FALLBACK_DIRECTIVE: &str = "info";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let (filter, rejected) = build_filter(cli_level, env_value.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    if let Some(bad) = rejected {
        tracing::warn!(
            env = LOG_ENV_VAR,
            value = %bad,
            "ignoring unparsable log directives; using {FALLBACK_DIRECTIVE}"
        );
    }
    Ok(())
}

/// Pick the filter: CLI level, else `env_value` directives, else `info`.
///
/// The second element is the env value when it was present but unparsable.
pub fn build_filter(
    cli_level: Option<LogLevel>,
    env_value: Option<&str>,
) -> (EnvFilter, Option<String>) {
    if let Some(level) = cli_level {
        return (EnvFilter::new(level_filter(level).to_string()), None);
    }

    let Some(raw) = env_value.map(str::trim).filter(|v| !v.is_empty()) else {
        return (EnvFilter::new(FALLBACK_DIRECTIVE), None);
    };

    match EnvFilter::try_new(raw) {
        Ok(filter) => (filter, None),
        Err(_) => (EnvFilter::new(FALLBACK_DIRECTIVE), Some(raw.to_string())),
    }
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}
