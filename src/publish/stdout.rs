// src/publish/stdout.rs

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::{EffectsError, Result};

use super::{CommandPublisher, Payload, PublishFuture};

/// Writes each command to stdout as `<destination> <json payload>`.
///
/// Lines from concurrent executions never interleave: the stdout handle is
/// held for the duration of one write.
pub struct StdoutPublisher {
    out: Mutex<tokio::io::Stdout>,
}

impl StdoutPublisher {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Render one command as the single line the stdout publisher emits.
pub fn format_line(destination: &str, payload: &Payload) -> Result<String> {
    let json = serde_json::to_string(payload).map_err(|e| EffectsError::PublishFailed {
        destination: destination.to_string(),
        reason: format!("payload is not serialisable: {e}"),
    })?;
    Ok(format!("{destination} {json}\n"))
}

impl CommandPublisher for StdoutPublisher {
    fn publish<'a>(&'a self, destination: &'a str, payload: &'a Payload) -> PublishFuture<'a> {
        Box::pin(async move {
            let line = format_line(destination, payload)?;

            let mut out = self.out.lock().await;
            let write = async {
                out.write_all(line.as_bytes()).await?;
                out.flush().await
            };
            write.await.map_err(|e| EffectsError::PublishFailed {
                destination: destination.to_string(),
                reason: e.to_string(),
            })?;

            debug!(%destination, "published command to stdout");
            Ok(())
        })
    }
}
