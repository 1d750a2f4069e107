//! seqgen
//!
//! Feedback-directed random unit-test generation:
//!
//! - **Generation engine**: see [`seqgen_core`] for the generator, filters,
//!   contracts and suite rendering
//! - **Demo catalog**: a small set of target types to generate tests for
//! - **Run configuration**: the JSON config document and its defaults
//! - **Output**: writing the rendered suite and the JSON run report
//!
//! The `seqgen` binary wires these together.

pub mod config;
pub mod demo;
pub mod output;

pub use config::RunConfig;
pub use seqgen_core;
pub use seqgen_types;
