// src/engine/plan.rs

//! Step ordering and inter-step delays.
//!
//! Pure functions only: no clocks, no Tokio.

use std::time::Duration;

use crate::catalog::Step;

/// A step in execution order, plus how long to wait after publishing it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    pub step: Step,
    /// `next.offset_ms - step.offset_ms`, or zero for the last step.
    pub delay_after: Duration,
}

/// Copy `steps` into execution order: offset ascending, declared `order`
/// ascending for equal offsets.
///
/// The sort is stable, so steps that also share an `order` keep their
/// declaration order.
pub fn sort_steps(steps: &[Step]) -> Vec<Step> {
    let mut sorted = steps.to_vec();
    sorted.sort_by_key(|s| (s.offset_ms, s.order));
    sorted
}

/// Sort `steps` and attach the delay that follows each one.
///
/// Delays come from the declared offsets of consecutive steps, not from
/// elapsed time, so a slow publish stretches the whole run rather than
/// shortening the next gap.
pub fn plan_steps(steps: &[Step]) -> Vec<PlannedStep> {
    let sorted = sort_steps(steps);

    let mut delays: Vec<Duration> = sorted
        .windows(2)
        .map(|pair| Duration::from_millis(pair[1].offset_ms - pair[0].offset_ms))
        .collect();
    delays.push(Duration::ZERO);

    sorted
        .into_iter()
        .zip(delays)
        .map(|(step, delay_after)| PlannedStep { step, delay_after })
        .collect()
}

/// Offset of the last step, i.e. the run time with an instantaneous publisher.
pub fn nominal_span(steps: &[Step]) -> Duration {
    let max = steps.iter().map(|s| s.offset_ms).max().unwrap_or(0);
    Duration::from_millis(max)
}
