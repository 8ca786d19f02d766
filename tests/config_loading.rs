// tests/config_loading.rs

use std::io::Write;

use serde_json::json;
use tempfile::NamedTempFile;

use effects_controller::config::{load_and_validate, parse_and_validate};
use effects_controller::errors::EffectsError;
use effects_controller::types::PublisherKind;

const CATALOG: &str = r#"
[config]
namespace = "paragon"
event_buffer = 32
max_retained_executions = 10

[[sequence]]
id = "clockwork-pilotlight-solve"
name = "Pilot Light Solve Sequence"
puzzle_id = "clockwork-pilotlight"
room_id = "clockwork"
duration_ms = 10000

[[sequence.step]]
order = 2
offset_ms = 50
action = "start-boiler"
description = "Trigger the boiler startup animation"
payload = { command = "startBoiler" }

[[sequence.step]]
order = 1
action = "play-pilotlight-sfx"
topic = "paragon/Clockwork/Audio/commands/playCue"
payload = { command = "playCue", cueId = "Q3" }

[[sequence]]
id = "vern-intro"
puzzle_id = "vern-intro"
room_id = "vern"

[[sequence.step]]
order = 1
action = "go"
"#;

#[test]
fn loads_sequences_in_declaration_order() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{CATALOG}").unwrap();

    let cfg = load_and_validate(file.path()).expect("valid catalog");
    assert_eq!(cfg.config.namespace, "paragon");
    assert_eq!(cfg.config.event_buffer, 32);
    assert_eq!(cfg.config.max_retained_executions, 10);
    assert_eq!(cfg.publisher.kind, PublisherKind::Stdout);

    let defs = cfg.definitions();
    let ids: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["clockwork-pilotlight-solve", "vern-intro"]);

    let pilot = &defs[0];
    assert_eq!(pilot.name, "Pilot Light Solve Sequence");
    assert_eq!(pilot.duration_ms, 10000);
    assert_eq!(pilot.steps.len(), 2);

    // Declared order is kept in the definition; sorting happens at run time.
    assert_eq!(pilot.steps[0].action, "start-boiler");
    assert_eq!(pilot.steps[0].offset_ms, 50);
    assert_eq!(pilot.steps[1].offset_ms, 0);
    assert_eq!(
        pilot.steps[1].topic.as_deref(),
        Some("paragon/Clockwork/Audio/commands/playCue")
    );
    let payload = pilot.steps[1].payload.clone().expect("payload");
    assert_eq!(payload.get("cueId"), Some(&json!("Q3")));

    // Name defaults to the id.
    assert_eq!(defs[1].name, "vern-intro");
    assert!(defs[1].steps[0].payload.is_none());
}

#[test]
fn defaults_apply_when_sections_are_missing() {
    let cfg = parse_and_validate(
        r#"
[[sequence]]
id = "s"
puzzle_id = "p"
room_id = "r"

[[sequence.step]]
action = "go"
"#,
    )
    .expect("valid");

    assert_eq!(cfg.config.namespace, "paragon");
    assert_eq!(cfg.config.event_buffer, 256);
    assert_eq!(cfg.config.max_retained_executions, 1000);
    assert_eq!(cfg.publisher.kind, PublisherKind::Stdout);
    assert_eq!(cfg.sequence[0].step[0].order, 0);
    assert_eq!(cfg.sequence[0].step[0].offset_ms, 0);
}

#[test]
fn duplicate_ids_are_accepted() {
    let cfg = parse_and_validate(
        r#"
[[sequence]]
id = "dup"
puzzle_id = "p"
room_id = "r"
[[sequence.step]]
action = "first"

[[sequence]]
id = "dup"
puzzle_id = "p"
room_id = "r"
[[sequence.step]]
action = "second"
"#,
    )
    .expect("duplicates are legal");

    assert_eq!(cfg.definitions().len(), 2);
}

fn expect_config_error(toml: &str, needle: &str) {
    match parse_and_validate(toml) {
        Err(EffectsError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}")
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn sequence_without_steps_is_rejected() {
    expect_config_error(
        r#"
[[sequence]]
id = "empty"
puzzle_id = "p"
room_id = "r"
"#,
        "at least one",
    );
}

#[test]
fn empty_action_is_rejected() {
    expect_config_error(
        r#"
[[sequence]]
id = "s"
puzzle_id = "p"
room_id = "r"
[[sequence.step]]
action = "  "
"#,
        "empty `action`",
    );
}

#[test]
fn empty_room_is_rejected() {
    expect_config_error(
        r#"
[[sequence]]
id = "s"
puzzle_id = "p"
room_id = ""
[[sequence.step]]
action = "go"
"#,
        "room_id",
    );
}

#[test]
fn shell_publisher_needs_a_command() {
    expect_config_error(
        r#"
[publisher]
kind = "shell"
"#,
        "requires a non-empty `cmd`",
    );
}

#[test]
fn zero_event_buffer_is_rejected() {
    expect_config_error(
        r#"
[config]
event_buffer = 0
"#,
        "event_buffer",
    );
}

#[test]
fn negative_offset_fails_to_parse() {
    let result = parse_and_validate(
        r#"
[[sequence]]
id = "s"
puzzle_id = "p"
room_id = "r"
[[sequence.step]]
action = "go"
offset_ms = -5
"#,
    );

    assert!(matches!(result, Err(EffectsError::TomlError(_))));
}

#[test]
fn unknown_publisher_kind_fails_to_parse() {
    let result = parse_and_validate(
        r#"
[publisher]
kind = "carrier-pigeon"
"#,
    );

    assert!(matches!(result, Err(EffectsError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = load_and_validate("/definitely/not/here/Effects.toml");
    assert!(matches!(result, Err(EffectsError::IoError(_))));
}
