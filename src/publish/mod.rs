// src/publish/mod.rs

//! Command publisher abstraction.
//!
//! The engine talks to a [`CommandPublisher`] instead of a concrete MQTT
//! client. This makes it easy to swap in a recording publisher in tests while
//! the binary ships two transport adapters:
//!
//! - [`StdoutPublisher`] prints one `<topic> <json>` line per command.
//! - [`ShellPublisher`] runs a configured shell command per command (for
//!   example `mosquitto_pub`), via `tokio::process::Command`.

pub mod shell;
pub mod stdout;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub use crate::catalog::Payload;
use crate::config::PublisherSection;
use crate::errors::{EffectsError, Result};
use crate::types::PublisherKind;

pub use shell::ShellPublisher;
pub use stdout::StdoutPublisher;

/// Boxed future returned by [`CommandPublisher::publish`].
pub type PublishFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Delivers one command to one destination.
///
/// Implementations may fail transiently; the engine does not retry, it
/// records the failure on the execution. Calling `publish` repeatedly with the
/// same arguments must be safe.
pub trait CommandPublisher: Send + Sync {
    fn publish<'a>(&'a self, destination: &'a str, payload: &'a Payload) -> PublishFuture<'a>;
}

/// Build the publisher described by the `[publisher]` config section.
pub fn from_config(section: &PublisherSection) -> Result<Arc<dyn CommandPublisher>> {
    match section.kind {
        PublisherKind::Stdout => Ok(Arc::new(StdoutPublisher::new())),
        PublisherKind::Shell => {
            let cmd = section.cmd.clone().ok_or_else(|| {
                EffectsError::ConfigError("shell publisher requires `cmd`".to_string())
            })?;
            let timeout = section.timeout_ms.map(Duration::from_millis);
            Ok(Arc::new(ShellPublisher::new(cmd, timeout)))
        }
    }
}
