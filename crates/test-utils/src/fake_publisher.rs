use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use effects_controller::errors::EffectsError;
use effects_controller::publish::{CommandPublisher, Payload, PublishFuture};

/// One call to [`RecordingPublisher::publish`].
#[derive(Debug, Clone)]
pub struct PublishCall {
    pub destination: String,
    pub payload: Payload,
    /// When the call started.
    pub at: Instant,
    /// Whether the call reported success.
    pub ok: bool,
}

#[derive(Debug, Default)]
struct Behaviour {
    fail_on_call: Option<usize>,
    panic_on_call: Option<usize>,
    fail_when_destination_contains: Vec<String>,
    latency: Option<Duration>,
}

/// A fake publisher that:
/// - records every call (destination, payload, start instant, outcome)
/// - optionally waits `latency` before answering
/// - optionally fails the N-th call, or any call whose destination contains
///   a given substring
/// - optionally panics on the N-th call.
///
/// Call numbers are 1-based and counted across all executions.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    calls: Mutex<Vec<PublishCall>>,
    behaviour: Behaviour,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.behaviour.fail_on_call = Some(n);
        self
    }

    pub fn panicking_on_call(mut self, n: usize) -> Self {
        self.behaviour.panic_on_call = Some(n);
        self
    }

    pub fn failing_when_destination_contains(mut self, needle: &str) -> Self {
        self.behaviour
            .fail_when_destination_contains
            .push(needle.to_string());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.behaviour.latency = Some(latency);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<PublishCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn destinations(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.destination).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl CommandPublisher for RecordingPublisher {
    fn publish<'a>(&'a self, destination: &'a str, payload: &'a Payload) -> PublishFuture<'a> {
        Box::pin(async move {
            let at = Instant::now();
            let call_no = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(PublishCall {
                    destination: destination.to_string(),
                    payload: payload.clone(),
                    at,
                    ok: true,
                });
                calls.len()
            };

            if let Some(latency) = self.behaviour.latency {
                tokio::time::sleep(latency).await;
            }

            if self.behaviour.panic_on_call == Some(call_no) {
                panic!("publisher blew up on call {call_no}");
            }

            let fail = self.behaviour.fail_on_call == Some(call_no)
                || self
                    .behaviour
                    .fail_when_destination_contains
                    .iter()
                    .any(|needle| destination.contains(needle.as_str()));

            if fail {
                self.calls.lock().unwrap()[call_no - 1].ok = false;
                return Err(EffectsError::PublishFailed {
                    destination: destination.to_string(),
                    reason: format!("simulated broker failure on call {call_no}"),
                });
            }

            Ok(())
        })
    }
}
