#![allow(dead_code)]

pub use effects_controller_test_utils::builders::{engine_with, SequenceBuilder, StepBuilder};
pub use effects_controller_test_utils::fake_publisher::RecordingPublisher;
pub use effects_controller_test_utils::{
    drain_events, events_until_terminal, init_tracing, kinds_for, with_timeout,
};

use effects_controller::catalog::SequenceDefinition;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Four steps at offsets 0, 10, 20 and 30 ms.
pub fn four_step_sequence(id: &str) -> SequenceDefinition {
    SequenceBuilder::new(id)
        .action_at(0, "clockwork-pilotlight-step-one")
        .action_at(10, "clockwork-pilotlight-step-two")
        .action_at(20, "clockwork-pilotlight-step-three")
        .action_at(30, "clockwork-pilotlight-step-four")
        .build()
}
