// tests/publishers.rs

use std::time::Duration;

use serde_json::json;

use effects_controller::catalog::Payload;
use effects_controller::config::model::PublisherSection;
use effects_controller::errors::EffectsError;
use effects_controller::publish::{self, stdout::format_line};
use effects_controller::types::PublisherKind;

fn payload() -> Payload {
    let mut p = Payload::new();
    p.insert("command".to_string(), json!("startBoiler"));
    p.insert("speed".to_string(), json!(1000));
    p
}

#[test]
fn stdout_line_is_destination_then_json() {
    let line = format_line("paragon/Clockwork/Boiler/Controller/commands/start", &payload())
        .unwrap();
    assert_eq!(
        line,
        "paragon/Clockwork/Boiler/Controller/commands/start {\"command\":\"startBoiler\",\"speed\":1000}\n"
    );
}

#[test]
fn from_config_rejects_shell_without_command() {
    let section = PublisherSection {
        kind: PublisherKind::Shell,
        cmd: None,
        timeout_ms: None,
    };
    assert!(matches!(
        publish::from_config(&section),
        Err(EffectsError::ConfigError(_))
    ));

    let section = PublisherSection::default();
    assert!(publish::from_config(&section).is_ok());
}

#[cfg(unix)]
mod shell {
    use super::*;

    use effects_controller::publish::{CommandPublisher, ShellPublisher};

    #[tokio::test]
    async fn command_sees_topic_and_payload_in_env() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("published.txt");
        let cmd = format!(
            "printf '%s %s' \"$EFFECTS_TOPIC\" \"$EFFECTS_PAYLOAD\" > '{}'",
            out.display()
        );

        let publisher = ShellPublisher::new(cmd, None);
        publisher
            .publish("paragon/Clockwork/Gears/Controller/commands/spin", &payload())
            .await
            .unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            written,
            "paragon/Clockwork/Gears/Controller/commands/spin {\"command\":\"startBoiler\",\"speed\":1000}"
        );
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_publish_failure() {
        let publisher = ShellPublisher::new("echo broker down >&2; exit 3", None);
        let err = publisher
            .publish("paragon/Room/Puzzle/Controller/commands/go", &payload())
            .await
            .unwrap_err();

        match err {
            EffectsError::PublishFailed {
                destination,
                reason,
            } => {
                assert_eq!(destination, "paragon/Room/Puzzle/Controller/commands/go");
                assert!(reason.contains("code 3"), "reason: {reason}");
                assert!(reason.contains("broker down"), "reason: {reason}");
            }
            other => panic!("expected PublishFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let publisher = ShellPublisher::new("sleep 5", Some(Duration::from_millis(100)));
        let started = std::time::Instant::now();
        let err = publisher
            .publish("paragon/Room/Puzzle/Controller/commands/go", &payload())
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(4));
        match err {
            EffectsError::PublishFailed { reason, .. } => {
                assert!(reason.contains("timed out"), "reason: {reason}")
            }
            other => panic!("expected PublishFailed, got {other:?}"),
        }
    }
}
