//! Sequences: ordered, appendable programs of statements.

use serde::{Deserialize, Serialize};

use seqgen_types::Value;

use crate::error::ExecutionFailure;
use crate::invoker::Invoker;
use crate::render::{JUnitRenderer, TestRenderer};
use crate::statement::{Argument, Statement};

/// A contract that a produced value or an invocation broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub contract: String,
    /// Index of the offending statement.
    pub statement: usize,
    pub reason: String,
}

/// Why a sequence landed in the invalid collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// A statement raised during execution.
    Exception,
    /// Same structural fingerprint as an already accepted sequence.
    DuplicateStructure,
    /// Rejected by the named filter.
    Filtered { filter: String },
    /// Passed the filters but broke a contract.
    ContractViolation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Invalid(Rejection),
}

#[derive(Debug, Clone, Default)]
pub struct Sequence {
    id: u64,
    statements: Vec<Statement>,
    last_value: Option<Value>,
    failure: Option<ExecutionFailure>,
    violation: Option<Violation>,
    verdict: Option<Verdict>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation attempt number this sequence came from.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statement(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Append a statement and return its index.
    ///
    /// Back-references must point at statements already in the sequence.
    pub fn push(&mut self, statement: Statement) -> usize {
        debug_assert!(
            statement
                .arguments()
                .iter()
                .all(|arg| !matches!(arg, Argument::Result(i) if *i >= self.statements.len())),
            "statement refers forward"
        );
        self.statements.push(statement);
        self.statements.len() - 1
    }

    /// Append copies of all of `other`'s statements and return the offset at
    /// which they start, so that `other`'s statement `i` is now `offset + i`.
    pub fn concat(&mut self, other: &Sequence) -> usize {
        let offset = self.statements.len();
        self.statements
            .extend(other.statements.iter().map(|s| s.relocated(offset)));
        offset
    }

    /// Execute every statement in order, stopping at the first raise.
    pub fn execute(&mut self, invoker: &Invoker) -> Result<(), ExecutionFailure> {
        self.failure = None;
        self.last_value = None;
        for statement in &mut self.statements {
            statement.reset();
        }
        for i in 0..self.statements.len() {
            let (prior, rest) = self.statements.split_at_mut(i);
            if let Err(fault) = rest[0].execute(prior, invoker) {
                let failure = ExecutionFailure { statement: i, fault };
                self.failure = Some(failure.clone());
                return Err(failure);
            }
        }
        self.last_value = self.statements.last().and_then(|s| s.value().cloned());
        Ok(())
    }

    pub fn threw_exception(&self) -> bool {
        self.failure.is_some()
    }

    pub fn failure(&self) -> Option<&ExecutionFailure> {
        self.failure.as_ref()
    }

    pub fn last_statement(&self) -> Option<&Statement> {
        self.statements.last()
    }

    /// Value produced by the last statement in the latest execution.
    pub fn last_value(&self) -> Option<&Value> {
        self.last_value.as_ref()
    }

    /// Ordered concatenation of statement signatures.
    pub fn fingerprint(&self) -> String {
        self.statements
            .iter()
            .map(Statement::signature)
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn violation(&self) -> Option<&Violation> {
        self.violation.as_ref()
    }

    pub fn violated_contract(&self) -> Option<&str> {
        self.violation.as_ref().map(|v| v.contract.as_str())
    }

    pub fn violating_statement(&self) -> Option<&Statement> {
        self.violation
            .as_ref()
            .and_then(|v| self.statements.get(v.statement))
    }

    pub(crate) fn set_violation(&mut self, violation: Violation) {
        self.violation = Some(violation);
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.verdict, Some(Verdict::Valid))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.verdict {
            Some(Verdict::Invalid(rejection)) => Some(rejection),
            _ => None,
        }
    }

    pub(crate) fn set_verdict(&mut self, verdict: Verdict) {
        self.verdict = Some(verdict);
    }

    /// Give every value-producing statement a display name.
    pub fn bind_names(&mut self) {
        for (i, statement) in self.statements.iter_mut().enumerate() {
            if !statement.is_void() {
                let name = variable_stem(&statement.produced_type().simple_name());
                statement.set_name(format!("{name}{i}"));
            }
        }
    }

    /// Render as one JUnit test case.
    pub fn render(&self, is_valid: bool) -> String {
        JUnitRenderer::default().render_case(self, is_valid)
    }
}

/// `TestClass` -> `testClass`, `int[]` -> `intArray`.
fn variable_stem(type_name: &str) -> String {
    let base = type_name.replace("[]", "Array");
    let base: String = base
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => "v".to_string(),
    }
}
