// src/engine/destination.rs

//! Mapping from a step's action id to the topic its command is published on.
//!
//! Topic layout: `<namespace>/<Room>/<Puzzle>/Controller/commands/<command>`.
//!
//! - Actions with at least three hyphen-separated tokens carry their own
//!   room and puzzle: `clockwork-pilotlight-led-fire-animation` becomes
//!   `<ns>/Clockwork/Pilotlight/Controller/commands/ledFireAnimation`.
//! - Shorter actions (`go`, `start-boiler`) are published under the room and
//!   puzzle of the trigger context, with the action verbatim as the command.
//!
//! An action with an empty token (`clockwork--spin`, `gears-`) and a context
//! with an empty room or puzzle are rejected: either would put an empty
//! level into the topic.

use crate::catalog::Step;
use crate::errors::{EffectsError, Result};

use super::TriggerContext;

/// Where `step` should be published: its explicit `topic` if it has one,
/// otherwise the topic derived from its action id.
pub fn resolve_destination(
    namespace: &str,
    step: &Step,
    context: &TriggerContext,
) -> Result<String> {
    let topic = match step.topic {
        Some(ref topic) => topic.clone(),
        None => resolve_action_topic(namespace, &step.action, context)?,
    };
    ensure_publishable(&topic)?;
    Ok(topic)
}

/// Derive the command topic for `action`.
pub fn resolve_action_topic(
    namespace: &str,
    action: &str,
    context: &TriggerContext,
) -> Result<String> {
    if action.is_empty() {
        return Err(EffectsError::Destination("action id is empty".to_string()));
    }

    let parts: Vec<&str> = action.split('-').collect();
    if parts.iter().any(|token| token.is_empty()) {
        return Err(EffectsError::Destination(format!(
            "action '{action}' has an empty token"
        )));
    }

    if let [room, puzzle, command @ ..] = parts.as_slice() {
        if !command.is_empty() {
            return Ok(format!(
                "{namespace}/{}/{}/Controller/commands/{}",
                capitalize(room),
                capitalize(puzzle),
                camel_case(command)
            ));
        }
    }

    if context.room_id.is_empty() || context.puzzle_id.is_empty() {
        return Err(EffectsError::Destination(format!(
            "action '{action}' needs the trigger context's room and puzzle, but one is empty"
        )));
    }

    Ok(format!(
        "{namespace}/{}/{}/Controller/commands/{action}",
        capitalize(&context.room_id),
        context.puzzle_id
    ))
}

/// ASCII upper-case the first character and lower-case the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(s.len());
            out.push(first.to_ascii_uppercase());
            out.extend(chars.map(|c| c.to_ascii_lowercase()));
            out
        }
        None => String::new(),
    }
}

/// First token verbatim, every following token capitalized.
fn camel_case(tokens: &[&str]) -> String {
    let mut out = String::new();
    for (idx, token) in tokens.iter().enumerate() {
        if idx == 0 {
            out.push_str(token);
        } else {
            out.push_str(&capitalize(token));
        }
    }
    out
}

/// MQTT forbids wildcards and NUL in topics used for publishing.
fn ensure_publishable(topic: &str) -> Result<()> {
    if topic.is_empty() {
        return Err(EffectsError::Destination("topic is empty".to_string()));
    }
    if topic.contains(['+', '#', '\0']) {
        return Err(EffectsError::Destination(format!(
            "topic '{topic}' contains a wildcard or NUL character"
        )));
    }
    Ok(())
}
