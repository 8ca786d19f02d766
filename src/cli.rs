// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `effects-controller`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "effects-controller",
    version,
    about = "Run timed effect sequences by publishing commands to show devices.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config / sequence catalog file (TOML).
    ///
    /// Default: `Effects.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Sequence id to trigger. May be given multiple times.
    ///
    /// If omitted, sequence ids are read from stdin, one per line:
    /// `<sequence-id> [room] [puzzle] [session]`.
    #[arg(long, value_name = "ID")]
    pub trigger: Vec<String>,

    /// Override the room id of the trigger context.
    #[arg(long, value_name = "ROOM")]
    pub room: Option<String>,

    /// Override the puzzle id of the trigger context.
    #[arg(long, value_name = "PUZZLE")]
    pub puzzle: Option<String>,

    /// Session id attached to the trigger context.
    #[arg(long, value_name = "SESSION")]
    pub session: Option<String>,

    /// Print the sequence catalog and exit.
    #[arg(long)]
    pub list: bool,

    /// Parse + validate, print each sequence's resolved plan, publish nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EFFECTS_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
