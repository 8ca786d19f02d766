pub mod builders;
pub mod fake_publisher;

use std::sync::Once;
use std::time::Duration;

use effects_controller::engine::SequenceEvent;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Drain every event currently buffered in `rx` without waiting.
pub fn drain_events(rx: &mut broadcast::Receiver<SequenceEvent>) -> Vec<SequenceEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Event kinds (`"started"`, `"step"`, ...) for the given execution, in order.
pub fn kinds_for(events: &[SequenceEvent], execution_id: &str) -> Vec<&'static str> {
    events
        .iter()
        .filter(|e| e.execution().id == execution_id)
        .map(|e| e.kind())
        .collect()
}

/// Receive events until the terminal (`completed` / `failed`) event of
/// `execution_id` arrives; returns everything received, terminal included.
pub async fn events_until_terminal(
    rx: &mut broadcast::Receiver<SequenceEvent>,
    execution_id: &str,
) -> Vec<SequenceEvent> {
    let mut events = Vec::new();
    loop {
        let event = rx.recv().await.expect("event bus closed or lagged");
        let done = event.is_terminal() && event.execution().id == execution_id;
        events.push(event);
        if done {
            return events;
        }
    }
}
