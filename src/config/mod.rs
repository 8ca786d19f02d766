// src/config/mod.rs

//! Configuration loading and validation for the effects controller.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like non-empty actions (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_and_validate, DEFAULT_CONFIG_FILE};
pub use model::{
    ConfigFile, ConfigSection, PublisherSection, RawConfigFile, SequenceConfig, StepConfig,
};
