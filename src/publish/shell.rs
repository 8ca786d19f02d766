// src/publish/shell.rs

//! Shell-command publisher.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::{EffectsError, Result};

use super::{CommandPublisher, Payload, PublishFuture};

/// Environment variable carrying the resolved destination topic.
pub const TOPIC_ENV: &str = "EFFECTS_TOPIC";
/// Environment variable carrying the JSON-encoded payload.
pub const PAYLOAD_ENV: &str = "EFFECTS_PAYLOAD";

/// Publishes each command by running a shell command, e.g.
///
/// ```text
/// mosquitto_pub -h broker -q 2 -t "$EFFECTS_TOPIC" -m "$EFFECTS_PAYLOAD"
/// ```
///
/// A non-zero exit status, a spawn error or an elapsed timeout is a publish
/// failure. The child is killed if the publish future is dropped.
pub struct ShellPublisher {
    cmd: String,
    timeout: Option<Duration>,
}

impl ShellPublisher {
    pub fn new(cmd: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            cmd: cmd.into(),
            timeout,
        }
    }

    async fn run(&self, destination: &str, payload: &Payload) -> Result<()> {
        let fail = |reason: String| EffectsError::PublishFailed {
            destination: destination.to_string(),
            reason,
        };

        let json = serde_json::to_string(payload)
            .map_err(|e| fail(format!("payload is not serialisable: {e}")))?;

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.env(TOPIC_ENV, destination)
            .env(PAYLOAD_ENV, &json)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| fail(format!("spawning publish command: {e}")))?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| fail(format!("publish command timed out after {limit:?}")))?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| fail(format!("waiting for publish command: {e}")))?;

        if output.status.success() {
            debug!(%destination, "publish command succeeded");
            return Ok(());
        }

        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(%destination, exit_code = code, %stderr, "publish command failed");

        Err(fail(if stderr.is_empty() {
            format!("publish command exited with code {code}")
        } else {
            format!("publish command exited with code {code}: {stderr}")
        }))
    }
}

impl CommandPublisher for ShellPublisher {
    fn publish<'a>(&'a self, destination: &'a str, payload: &'a Payload) -> PublishFuture<'a> {
        Box::pin(self.run(destination, payload))
    }
}
