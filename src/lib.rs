// src/lib.rs

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod publish;
pub mod types;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::catalog::{SequenceDefinition, SequenceRegistry};
use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{
    nominal_span, plan_steps, resolve_destination, spawn_observer, ContextOverride, EngineOptions,
    ExecutionId, LoggingObserver, SequenceEngine, TriggerContext,
};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - sequence registry
/// - publisher + engine
/// - the logging observer
/// - triggers from `--trigger` or stdin
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let registry: SequenceRegistry = cfg.definitions().into_iter().collect();

    if args.list {
        print_catalog(&registry);
        return Ok(());
    }

    if args.dry_run {
        print_dry_run(&cfg, &registry);
        return Ok(());
    }

    for id in &args.trigger {
        if registry.get(id).is_none() {
            bail!("unknown sequence '{id}' passed to --trigger");
        }
    }

    let publisher = publish::from_config(&cfg.publisher)?;
    let engine = SequenceEngine::new(registry, publisher, EngineOptions::from(cfg.config.clone()));
    let _observer = spawn_observer(engine.events(), LoggingObserver);

    let overrides = ContextOverride {
        puzzle_id: args.puzzle.clone(),
        room_id: args.room.clone(),
        session_id: args.session.clone(),
    };

    let work = async {
        let started = if args.trigger.is_empty() {
            trigger_from_stdin(&engine, &overrides).await
        } else {
            trigger_all(&engine, &args.trigger, &overrides)?
        };
        info!(count = started.len(), "all triggers issued; waiting for executions to finish");
        engine.wait_idle().await;
        Ok::<_, anyhow::Error>(started)
    };

    // Ctrl-C abandons whatever is still running.
    let started = tokio::select! {
        res = work => res?,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            let active = engine.active_executions().len();
            info!(active, "shutdown requested; abandoning in-flight executions");
            Vec::new()
        }
    };
    debug!(?started, "executions started by this process");

    let summary = engine.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.executions.failed > 0 {
        bail!("{} execution(s) failed", summary.executions.failed);
    }
    Ok(())
}

fn trigger_all(
    engine: &SequenceEngine,
    ids: &[String],
    overrides: &ContextOverride,
) -> Result<Vec<ExecutionId>> {
    let mut started = Vec::with_capacity(ids.len());
    for id in ids {
        started.push(engine.trigger(id, overrides.clone())?);
    }
    Ok(started)
}

/// Read `<sequence-id> [room] [puzzle] [session]` lines until EOF.
async fn trigger_from_stdin(
    engine: &SequenceEngine,
    defaults: &ContextOverride,
) -> Vec<ExecutionId> {
    trigger_from_reader(engine, BufReader::new(tokio::io::stdin()), defaults).await
}

/// Trigger one execution per line of `reader`.
///
/// Unknown ids and lines that are not UTF-8 are logged and skipped. Fields
/// given on the line take precedence over `defaults`. Any other read error
/// ends the input; executions already started keep running.
pub async fn trigger_from_reader<R>(
    engine: &SequenceEngine,
    reader: R,
    defaults: &ContextOverride,
) -> Vec<ExecutionId>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut started = Vec::new();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!(error = %e, "skipping trigger line that is not valid UTF-8");
                continue;
            }
            Err(e) => {
                warn!(error = %e, "failed to read triggers; no further input will be accepted");
                break;
            }
        };

        let Some((id, overrides)) = parse_trigger_line(&line, defaults) else {
            continue;
        };

        match engine.trigger(&id, overrides) {
            Ok(exec_id) => started.push(exec_id),
            Err(e) => warn!(sequence = %id, error = %e, "ignoring trigger"),
        }
    }

    started
}

/// Parse one stdin trigger line. Blank lines and `#` comments yield `None`.
pub fn parse_trigger_line(
    line: &str,
    defaults: &ContextOverride,
) -> Option<(String, ContextOverride)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut fields = line.split_whitespace().map(str::to_string);
    let id = fields.next()?;
    let overrides = ContextOverride {
        room_id: fields.next().or_else(|| defaults.room_id.clone()),
        puzzle_id: fields.next().or_else(|| defaults.puzzle_id.clone()),
        session_id: fields.next().or_else(|| defaults.session_id.clone()),
    };
    Some((id, overrides))
}

fn print_catalog(registry: &SequenceRegistry) {
    println!("sequences ({}):", registry.len());
    for def in registry.list() {
        println!(
            "  - {} ({}) room={} puzzle={} steps={} duration_ms={}",
            def.id,
            def.name,
            def.room_id,
            def.puzzle_id,
            def.steps.len(),
            def.duration_ms
        );
    }
}

/// Dry-run output: each sequence's steps in execution order with the topic
/// they would be published to under the sequence's own context.
fn print_dry_run(cfg: &ConfigFile, registry: &SequenceRegistry) {
    println!("effects-controller dry-run");
    println!("  config.namespace = {}", cfg.config.namespace);
    println!("  config.event_buffer = {}", cfg.config.event_buffer);
    println!(
        "  config.max_retained_executions = {}",
        cfg.config.max_retained_executions
    );
    println!("  publisher.kind = {:?}", cfg.publisher.kind);
    println!();

    for def in registry.list() {
        print_plan(&cfg.config.namespace, &def);
    }

    debug!("dry-run complete (nothing published)");
}

fn print_plan(namespace: &str, def: &Arc<SequenceDefinition>) {
    let context = TriggerContext::for_definition(def, ContextOverride::default());
    println!(
        "{} ({}) nominal span {:?}:",
        def.id,
        def.name,
        nominal_span(&def.steps)
    );
    for planned in plan_steps(&def.steps) {
        let step = &planned.step;
        let topic = resolve_destination(namespace, step, &context)
            .unwrap_or_else(|e| format!("<unresolvable: {e}>"));
        println!("  +{:>6}ms  {:<32} -> {}", step.offset_ms, step.action, topic);
        if let Some(ref desc) = step.description {
            println!("             {desc}");
        }
    }
}
