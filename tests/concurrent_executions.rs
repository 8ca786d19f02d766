// tests/concurrent_executions.rs

mod common;
use crate::common::{
    engine_with, init_tracing, with_timeout, RecordingPublisher, SequenceBuilder, TestResult,
};

use std::collections::HashSet;

use effects_controller::engine::ContextOverride;
use effects_controller::types::ExecutionStatus;

const N: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_triggers_stay_independent() -> TestResult {
    init_tracing();

    let sequences = (0..N)
        .map(|i| {
            SequenceBuilder::new(&format!("seq-{i}"))
                .action_at(0, &format!("room{i}-panel-light-on"))
                .action_at(20, &format!("room{i}-panel-light-off"))
                .build()
        })
        .collect();

    // Every command for room 3 fails; nothing else does.
    let publisher = RecordingPublisher::new()
        .failing_when_destination_contains("/Room3/")
        .into_arc();
    let engine = engine_with(sequences, publisher.clone());

    let mut handles = Vec::new();
    for i in 0..N {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.trigger(&format!("seq-{i}"), ContextOverride::default())
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await??);
    }

    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), N);

    for id in &ids {
        let exec = with_timeout(engine.wait_for(id)).await?;
        let room_index: usize = exec
            .sequence_id
            .trim_start_matches("seq-")
            .parse()?;

        if room_index == 3 {
            assert_eq!(exec.status, ExecutionStatus::Failed);
            assert_eq!(exec.current_step, 1);
        } else {
            assert_eq!(exec.status, ExecutionStatus::Completed, "{}", exec.sequence_id);
            assert_eq!(exec.current_step, 2);
        }
    }

    // 7 sequences x 2 steps, plus the single failed attempt for room 3.
    assert_eq!(publisher.call_count(), (N - 1) * 2 + 1);

    // Within each execution, "on" is published before "off".
    let destinations = publisher.destinations();
    for i in (0..N).filter(|&i| i != 3) {
        let room = format!("/Room{i}/");
        let own: Vec<&String> = destinations.iter().filter(|d| d.contains(&room)).collect();
        assert_eq!(own.len(), 2);
        assert!(own[0].ends_with("lightOn"));
        assert!(own[1].ends_with("lightOff"));
    }

    assert!(engine.active_executions().is_empty());

    Ok(())
}

#[tokio::test]
async fn same_sequence_can_run_concurrently_with_itself() -> TestResult {
    init_tracing();

    let seq = SequenceBuilder::new("pulse")
        .action_at(0, "clockwork-gears-pulse-start")
        .action_at(50, "clockwork-gears-pulse-stop")
        .build();

    let publisher = RecordingPublisher::new().into_arc();
    let engine = engine_with(vec![seq], publisher.clone());

    let a = engine.trigger("pulse", ContextOverride::default())?;
    let b = engine.trigger("pulse", ContextOverride::default())?;
    assert_eq!(engine.active_executions().len(), 2);

    engine.wait_idle().await;

    assert_eq!(engine.execution(&a)?.status, ExecutionStatus::Completed);
    assert_eq!(engine.execution(&b)?.status, ExecutionStatus::Completed);
    assert_eq!(publisher.call_count(), 4);

    Ok(())
}
