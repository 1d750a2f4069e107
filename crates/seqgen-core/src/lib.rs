//! seqgen core
//!
//! Feedback-directed random generation of call sequences.
//!
//! A run repeatedly grows a [`Sequence`] of statements ending in a call to
//! one of the target types' public methods, executes it, and classifies it
//! as valid or invalid. Valid sequences are fed back into the [`ValuePool`]
//! so later sequences can reuse the objects they built.
//!
//! # Core Modules
//!
//! - [`statement`]: statements and back-reference arguments
//! - [`sequence`]: sequences, fingerprints and verdicts
//! - [`pool`]: the type-indexed value pool
//! - [`contracts`]: the contract oracle and its registry
//! - [`filters`]: the filter pipeline and its registry
//! - [`generator`]: run configuration and the generation loop
//! - [`render`]: JUnit source rendering
//!
//! # Example
//!
//! ```ignore
//! use seqgen_core::{Generator, GeneratorConfig};
//!
//! let generator = Generator::new(catalog, &["TestClass"], GeneratorConfig::default())?;
//! let report = generator.run();
//! println!("{} valid, {} invalid", report.valid.len(), report.invalid.len());
//! ```

pub mod contracts;
pub mod error;
pub mod filters;
pub mod generator;
pub mod invoker;
pub mod pool;
pub mod render;
pub mod report;
pub mod sequence;
pub mod statement;
pub mod value_gen;

pub use contracts::{
    Contract, ContractOracle, ContractOutcome, ContractRegistry, Subject, BUILTIN_CONTRACTS,
};
pub use error::{Abandon, ConfigError, ExecutionFailure};
pub use filters::{FilterPipeline, FilterRegistry, SequenceFilter, BUILTIN_FILTERS};
pub use generator::{Generator, GeneratorConfig};
pub use invoker::Invoker;
pub use pool::ValuePool;
pub use render::{JUnitRenderer, SuiteHeader, TestRenderer};
pub use report::{GenerationReport, GenerationStats, SequenceSummary};
pub use sequence::{Rejection, Sequence, Verdict, Violation};
pub use statement::{Argument, Invocation, Statement, StatementKind};
pub use value_gen::ValueGenerator;
