//! Sequence filters.
//!
//! Filters are ordered, named acceptance predicates over a fully executed
//! sequence. The pipeline stops at the first rejection and reports which
//! filter rejected. Filters may keep state for the whole run.

use std::collections::{BTreeMap, HashSet};

use tracing::trace;

use crate::error::ConfigError;
use crate::sequence::Sequence;

pub trait SequenceFilter: Send {
    fn name(&self) -> &str;

    fn is_valid(&mut self, seq: &Sequence) -> bool;
}

/// Rejects sequences that raised during execution.
#[derive(Debug, Default)]
pub struct ExceptionFilter;

impl SequenceFilter for ExceptionFilter {
    fn name(&self) -> &str {
        "ExceptionFilter"
    }

    fn is_valid(&mut self, seq: &Sequence) -> bool {
        !seq.threw_exception()
    }
}

/// Rejects sequences whose non-void last statement produced null.
#[derive(Debug, Default)]
pub struct NullFilter;

impl SequenceFilter for NullFilter {
    fn name(&self) -> &str {
        "NullFilter"
    }

    fn is_valid(&mut self, seq: &Sequence) -> bool {
        match seq.last_statement() {
            Some(last) if !last.is_void() => last.value().is_some_and(|v| !v.is_null()),
            _ => true,
        }
    }
}

/// Rejects sequences whose last value renders the same as one seen earlier
/// in the run.
#[derive(Debug, Default)]
pub struct EqualityFilter {
    seen: HashSet<String>,
}

impl EqualityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

impl SequenceFilter for EqualityFilter {
    fn name(&self) -> &str {
        "EqualityFilter"
    }

    fn is_valid(&mut self, seq: &Sequence) -> bool {
        let Some(last) = seq.last_statement() else {
            return true;
        };
        if last.is_void() {
            return true;
        }
        let Some(value) = last.value() else {
            return false;
        };
        match value.to_text() {
            Ok(text) => {
                let fresh = self.seen.insert(text);
                if !fresh {
                    trace!(seq = seq.id(), "observed value already seen");
                }
                fresh
            }
            Err(_) => false,
        }
    }
}

pub type FilterFactory = Box<dyn Fn() -> Box<dyn SequenceFilter> + Send + Sync>;

/// Names of the built-in filters, in their default order.
pub const BUILTIN_FILTERS: [&str; 3] = ["ExceptionFilter", "NullFilter", "EqualityFilter"];

/// Name to factory map for filters. Every lookup builds a fresh instance so
/// stateful filters never leak between runs.
pub struct FilterRegistry {
    factories: BTreeMap<String, FilterFactory>,
}

impl FilterRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("ExceptionFilter", || Box::new(ExceptionFilter));
        registry.register("NullFilter", || Box::new(NullFilter));
        registry.register("EqualityFilter", || Box::new(EqualityFilter::new()));
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn SequenceFilter> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn SequenceFilter>, ConfigError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ConfigError::UnknownFilter(name.to_string()))
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[derive(Default)]
pub struct FilterPipeline {
    filters: Vec<Box<dyn SequenceFilter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<S: AsRef<str>>(
        registry: &FilterRegistry,
        names: &[S],
    ) -> Result<Self, ConfigError> {
        let filters = names
            .iter()
            .map(|name| registry.create(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { filters })
    }

    pub fn push(&mut self, filter: Box<dyn SequenceFilter>) {
        self.filters.push(filter);
    }

    /// Remove every filter called `name`; returns whether any was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f.name() != name);
        self.filters.len() != before
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run the filters in order. Returns the name of the first one that
    /// rejects `seq`, or `None` if all accept.
    pub fn first_rejection(&mut self, seq: &Sequence) -> Option<String> {
        self.filters
            .iter_mut()
            .find_map(|f| (!f.is_valid(seq)).then(|| f.name().to_string()))
    }
}

impl std::fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPipeline")
            .field("filters", &self.names())
            .finish()
    }
}
