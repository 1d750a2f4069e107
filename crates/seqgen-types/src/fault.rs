//! Errors raised by target operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error raised by an invoked operation or by a value's
/// equality/hash/text behavior.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum Fault {
    /// A null receiver or argument was dereferenced.
    #[error("null dereference: {0}")]
    NullDereference(String),

    /// Arithmetic error such as division by zero.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// An argument was rejected by the operation's own validation.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// The operation was called in a state it does not support.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// An internal assertion inside the operation failed.
    #[error("assertion failed: {0}")]
    AssertionFailure(String),

    /// The call did not return within the configured budget.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// Any other raised error, tagged with a free-form kind.
    #[error("{kind}: {message}")]
    Raised { kind: String, message: String },
}

impl Fault {
    pub fn raised(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Fault::Raised {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Short name of the fault kind, used in reports and rendered tests.
    pub fn kind(&self) -> &str {
        match self {
            Fault::NullDereference(_) => "NullDereference",
            Fault::Arithmetic(_) => "Arithmetic",
            Fault::IllegalArgument(_) => "IllegalArgument",
            Fault::IllegalState(_) => "IllegalState",
            Fault::AssertionFailure(_) => "AssertionFailure",
            Fault::Timeout(_) => "Timeout",
            Fault::Raised { kind, .. } => kind,
        }
    }

    pub fn is_null_dereference(&self) -> bool {
        matches!(self, Fault::NullDereference(_))
    }

    pub fn is_assertion_failure(&self) -> bool {
        matches!(self, Fault::AssertionFailure(_))
    }
}
