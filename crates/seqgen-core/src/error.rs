//! Error types for the generation engine.
//!
//! Only [`ConfigError`] ever crosses the public boundary of a run; execution
//! failures and abandoned attempts are recovered inside the loop and show up
//! as classified sequences or counters in the report.

use seqgen_types::{Fault, TypeRef};
use thiserror::Error;

/// Fatal problems detected before generation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("no target types were given")]
    NoTargetTypes,

    #[error("target type '{0}' is not in the catalog")]
    UnknownType(String),

    #[error("no target type exposes an eligible public method")]
    NoEligibleOperations,

    #[error("unknown filter '{0}'")]
    UnknownFilter(String),

    #[error("unknown contract '{0}'")]
    UnknownContract(String),

    #[error("run is unbounded: set a time limit or a maximum sequence count")]
    Unbounded,
}

/// An operation raised while a statement was executing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("statement {statement} raised {fault}")]
pub struct ExecutionFailure {
    /// Index of the failing statement within its sequence.
    pub statement: usize,
    pub fault: Fault,
}

/// Why a single generation attempt was given up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Abandon {
    #[error("type {0} has no public constructor")]
    NoConstructor(TypeRef),

    #[error("constructor nesting for {0} exceeded the depth limit")]
    DepthExceeded(TypeRef),

    #[error("cannot synthesize a value of type {0}")]
    Unsynthesizable(TypeRef),
}

impl Abandon {
    /// Stable label used as a report counter key.
    pub fn label(&self) -> &'static str {
        match self {
            Abandon::NoConstructor(_) => "no_constructor",
            Abandon::DepthExceeded(_) => "depth_exceeded",
            Abandon::Unsynthesizable(_) => "unsynthesizable",
        }
    }
}
