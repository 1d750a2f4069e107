//! The contract oracle.
//!
//! A [`Contract`] is a predicate over a produced value or a recorded
//! invocation. The [`ContractOracle`] runs an ordered list of contracts over
//! every statement of an executed sequence and reports the first violation.
//! Contracts are looked up by name in a [`ContractRegistry`], so adding one
//! never touches the oracle loop.

use std::collections::BTreeMap;

use seqgen_types::Value;

use crate::error::ConfigError;
use crate::invoker::PANIC_FAULT_KIND;
use crate::sequence::{Sequence, Violation};
use crate::statement::{Invocation, Statement};

/// What a contract is checked against.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    /// A non-null value produced by a statement.
    Value(&'a Value),
    /// A recorded constructor or method call.
    Invocation(Invocation<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractOutcome {
    Pass,
    /// The property does not hold.
    Fail(String),
    /// Checking the property raised.
    Error(String),
}

impl ContractOutcome {
    pub fn is_violation(&self) -> bool {
        !matches!(self, ContractOutcome::Pass)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ContractOutcome::Pass => None,
            ContractOutcome::Fail(msg) | ContractOutcome::Error(msg) => Some(msg),
        }
    }
}

pub trait Contract: Send + Sync {
    fn name(&self) -> &str;

    fn is_applicable(&self, subject: &Subject<'_>) -> bool;

    fn check(&self, subject: &Subject<'_>) -> ContractOutcome;
}

// ---- Value contracts ----

/// `v.equals(v)` holds and does not raise.
pub struct EqualsReflexive;

impl Contract for EqualsReflexive {
    fn name(&self) -> &str {
        "EqualsReflexive"
    }

    fn is_applicable(&self, subject: &Subject<'_>) -> bool {
        matches!(subject, Subject::Value(v) if !v.is_null())
    }

    fn check(&self, subject: &Subject<'_>) -> ContractOutcome {
        let Subject::Value(v) = subject else {
            return ContractOutcome::Pass;
        };
        match v.equals_value(v) {
            Ok(true) => ContractOutcome::Pass,
            Ok(false) => ContractOutcome::Fail(format!(
                "equals is not reflexive for a {}",
                v.runtime_type_name()
            )),
            Err(fault) => ContractOutcome::Error(format!("equals raised {fault}")),
        }
    }
}

/// `hashCode` does not raise.
pub struct HashCodeSafe;

impl Contract for HashCodeSafe {
    fn name(&self) -> &str {
        "HashCodeSafe"
    }

    fn is_applicable(&self, subject: &Subject<'_>) -> bool {
        matches!(subject, Subject::Value(v) if !v.is_null())
    }

    fn check(&self, subject: &Subject<'_>) -> ContractOutcome {
        match subject {
            Subject::Value(v) => match v.hash_code() {
                Ok(_) => ContractOutcome::Pass,
                Err(fault) => ContractOutcome::Error(format!("hashCode raised {fault}")),
            },
            Subject::Invocation(_) => ContractOutcome::Pass,
        }
    }
}

/// `toString` does not raise.
pub struct ToStringSafe;

impl Contract for ToStringSafe {
    fn name(&self) -> &str {
        "ToStringSafe"
    }

    fn is_applicable(&self, subject: &Subject<'_>) -> bool {
        matches!(subject, Subject::Value(v) if !v.is_null())
    }

    fn check(&self, subject: &Subject<'_>) -> ContractOutcome {
        match subject {
            Subject::Value(v) => match v.to_text() {
                Ok(_) => ContractOutcome::Pass,
                Err(fault) => ContractOutcome::Error(format!("toString raised {fault}")),
            },
            Subject::Invocation(_) => ContractOutcome::Pass,
        }
    }
}

// ---- Invocation contracts ----

fn is_method_call(subject: &Subject<'_>) -> bool {
    matches!(subject, Subject::Invocation(inv) if !inv.op.is_constructor())
}

/// A method that dereferences null although every argument was non-null.
pub struct NoUnexpectedNullDereference;

impl Contract for NoUnexpectedNullDereference {
    fn name(&self) -> &str {
        "NoUnexpectedNullDereference"
    }

    fn is_applicable(&self, subject: &Subject<'_>) -> bool {
        is_method_call(subject)
    }

    fn check(&self, subject: &Subject<'_>) -> ContractOutcome {
        let Subject::Invocation(inv) = subject else {
            return ContractOutcome::Pass;
        };
        match inv.fault {
            Some(fault) if fault.is_null_dereference() => {
                if inv.args.iter().any(Value::is_null) {
                    ContractOutcome::Pass
                } else {
                    ContractOutcome::Error(format!(
                        "{} raised a null dereference with no null arguments",
                        inv.op.key()
                    ))
                }
            }
            _ => ContractOutcome::Pass,
        }
    }
}

/// A method that trips an internal assertion (or panics).
pub struct NoAssertionFailure;

impl Contract for NoAssertionFailure {
    fn name(&self) -> &str {
        "NoAssertionFailure"
    }

    fn is_applicable(&self, subject: &Subject<'_>) -> bool {
        is_method_call(subject)
    }

    fn check(&self, subject: &Subject<'_>) -> ContractOutcome {
        let Subject::Invocation(inv) = subject else {
            return ContractOutcome::Pass;
        };
        match inv.fault {
            Some(fault) if fault.is_assertion_failure() || fault.kind() == PANIC_FAULT_KIND => {
                ContractOutcome::Error(format!("{} raised {fault}", inv.op.key()))
            }
            _ => ContractOutcome::Pass,
        }
    }
}

// ---- Registry ----

pub type ContractFactory = Box<dyn Fn() -> Box<dyn Contract> + Send + Sync>;

/// Names of the built-in contracts, in their default order.
pub const BUILTIN_CONTRACTS: [&str; 5] = [
    "EqualsReflexive",
    "HashCodeSafe",
    "ToStringSafe",
    "NoUnexpectedNullDereference",
    "NoAssertionFailure",
];

/// Name to factory map for contracts.
pub struct ContractRegistry {
    factories: BTreeMap<String, ContractFactory>,
}

impl ContractRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("EqualsReflexive", || Box::new(EqualsReflexive));
        registry.register("HashCodeSafe", || Box::new(HashCodeSafe));
        registry.register("ToStringSafe", || Box::new(ToStringSafe));
        registry.register("NoUnexpectedNullDereference", || {
            Box::new(NoUnexpectedNullDereference)
        });
        registry.register("NoAssertionFailure", || Box::new(NoAssertionFailure));
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Contract> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Contract>, ConfigError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ConfigError::UnknownContract(name.to_string()))
    }
}

impl Default for ContractRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ---- Oracle ----

pub struct ContractOracle {
    contracts: Vec<Box<dyn Contract>>,
}

impl ContractOracle {
    pub fn new(contracts: Vec<Box<dyn Contract>>) -> Self {
        Self { contracts }
    }

    pub fn with_builtins() -> Self {
        let registry = ContractRegistry::with_builtins();
        let contracts = BUILTIN_CONTRACTS
            .iter()
            .filter_map(|name| registry.create(name).ok())
            .collect();
        Self::new(contracts)
    }

    /// Instantiate the named contracts, in order.
    pub fn from_names<S: AsRef<str>>(
        registry: &ContractRegistry,
        names: &[S],
    ) -> Result<Self, ConfigError> {
        let contracts = names
            .iter()
            .map(|name| registry.create(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(contracts))
    }

    /// First violated contract for `subject`, with its message.
    pub fn check_subject(&self, subject: &Subject<'_>) -> Option<(String, String)> {
        self.contracts
            .iter()
            .filter(|contract| contract.is_applicable(subject))
            .find_map(|contract| {
                let outcome = contract.check(subject);
                outcome.message().map(|msg| (contract.name().to_string(), msg.to_string()))
            })
    }

    /// Check one executed statement: its invocation record, then its value.
    pub fn check_statement(&self, statement: &Statement, index: usize) -> Option<Violation> {
        let invocation = statement.invocation().map(Subject::Invocation);
        let value = statement
            .value()
            .filter(|v| !v.is_null())
            .map(Subject::Value);
        invocation
            .into_iter()
            .chain(value)
            .find_map(|subject| self.check_subject(&subject))
            .map(|(contract, reason)| Violation {
                contract,
                statement: index,
                reason,
            })
    }

    /// First violation over the executed statements of `seq`, in execution order.
    pub fn check_sequence(&self, seq: &Sequence) -> Option<Violation> {
        seq.statements()
            .iter()
            .enumerate()
            .take_while(|(_, s)| s.is_executed())
            .find_map(|(i, s)| self.check_statement(s, i))
    }
}

impl Default for ContractOracle {
    fn default() -> Self {
        Self::with_builtins()
    }
}
