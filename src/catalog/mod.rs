// src/catalog/mod.rs

//! Sequence definitions and the registry that stores them.
//!
//! - [`definition`] holds the immutable `SequenceDefinition` / `Step` types
//!   the engine executes.
//! - [`registry`] is the keyed, registration-ordered store the engine reads
//!   from at trigger time.

pub mod definition;
pub mod registry;

pub use definition::{Payload, SequenceDefinition, Step};
pub use registry::SequenceRegistry;
