// tests/shipped_catalog.rs

mod common;
use crate::common::{init_tracing, with_timeout, RecordingPublisher, TestResult};

use std::path::PathBuf;

use serde_json::json;

use effects_controller::catalog::SequenceRegistry;
use effects_controller::config::{load_and_validate, DEFAULT_CONFIG_FILE};
use effects_controller::engine::{
    plan_steps, resolve_destination, ContextOverride, EngineOptions, SequenceEngine,
    TriggerContext,
};
use effects_controller::errors::EffectsError;
use effects_controller::types::ExecutionStatus;

fn shipped_registry() -> Result<(SequenceRegistry, EngineOptions), Box<dyn std::error::Error>> {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cfg = load_and_validate(manifest.join(DEFAULT_CONFIG_FILE))?;
    let options = EngineOptions::from(cfg.config.clone());
    Ok((cfg.definitions().into_iter().collect(), options))
}

#[test]
fn every_shipped_step_resolves_to_a_destination() -> TestResult {
    let (registry, options) = shipped_registry()?;
    assert_eq!(registry.len(), 6);
    assert_eq!(registry.count_by_room().get("clockwork"), Some(&6));

    for def in registry.list() {
        let ctx = TriggerContext::for_definition(&def, ContextOverride::default());
        for planned in plan_steps(&def.steps) {
            let topic = resolve_destination(&options.namespace, &planned.step, &ctx)?;
            assert!(topic.starts_with("paragon/"), "{} -> {topic}", def.id);
        }
    }

    Ok(())
}

#[tokio::test]
async fn raise_newel_publishes_its_configured_payload() -> TestResult {
    init_tracing();

    let (registry, options) = shipped_registry()?;
    let publisher = RecordingPublisher::new().into_arc();
    let engine = SequenceEngine::new(registry, publisher.clone(), options);

    let id = engine.trigger("clockwork-aether-raise-newel", ContextOverride::default())?;
    let exec = with_timeout(engine.wait_for(&id)).await?;
    assert_eq!(exec.status, ExecutionStatus::Completed);
    assert_eq!(exec.context.puzzle_id, "clockwork-crank");

    let calls = publisher.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].destination, "paragon/Raise/Newel/Controller/commands/post");
    assert_eq!(calls[0].payload.get("command"), Some(&json!("raiseNewelPost")));
    assert_eq!(calls[0].payload.get("speed"), Some(&json!(1000)));

    Ok(())
}

#[tokio::test]
async fn engine_exposes_the_shipped_catalog() -> TestResult {
    let (registry, options) = shipped_registry()?;
    let engine = SequenceEngine::new(registry, RecordingPublisher::new().into_arc(), options);

    assert_eq!(engine.namespace(), "paragon");
    assert_eq!(engine.sequences().len(), 6);
    assert_eq!(engine.sequences_by_room("clockwork").len(), 6);
    assert!(engine.sequences_by_room("study").is_empty());

    let crank: Vec<String> = engine
        .sequences_by_puzzle("clockwork-crank")
        .iter()
        .map(|d| d.id.clone())
        .collect();
    assert_eq!(crank, vec!["clockwork-aether-raise-newel"]);

    assert_eq!(engine.sequence("vern-death")?.puzzle_id, "clockwork-rope");
    assert!(matches!(
        engine.sequence("vern-encore"),
        Err(EffectsError::SequenceNotFound(_))
    ));

    Ok(())
}
