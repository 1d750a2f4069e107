//! The generation loop.
//!
//! Each attempt picks a target type and one of its public methods, grows a
//! sequence that ends in calls to that method, executes it and classifies
//! the outcome. Accepted sequences feed the value pool, so later attempts
//! build on earlier successes.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use seqgen_types::{Catalog, Operation, TypeRef, Value};

use crate::contracts::{ContractOracle, ContractRegistry, BUILTIN_CONTRACTS};
use crate::error::{Abandon, ConfigError};
use crate::filters::{FilterPipeline, FilterRegistry, SequenceFilter, BUILTIN_FILTERS};
use crate::invoker::Invoker;
use crate::pool::ValuePool;
use crate::report::{GenerationReport, GenerationStats};
use crate::sequence::{Rejection, Sequence, Verdict};
use crate::statement::{Argument, Statement};
use crate::value_gen::ValueGenerator;

/// Run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Wall-clock budget; 0 disables the time bound.
    pub time_limit_ms: u64,
    /// Maximum number of generation attempts; 0 disables the count bound.
    pub max_sequences: u64,
    /// Method names to exercise; empty means every public method.
    pub allowed_methods: Vec<String>,
    pub reuse_probability: f64,
    pub null_probability: f64,
    pub fresh_value_probability: f64,
    /// Fresh-literal probability for constructor arguments.
    pub constructor_fresh_probability: f64,
    /// Chance of appending the chosen method once more.
    pub repeat_probability: f64,
    pub max_collection_len: usize,
    pub max_string_len: usize,
    pub max_constructor_depth: usize,
    pub seed: Option<u64>,
    pub call_timeout_ms: Option<u64>,
    pub filters: Vec<String>,
    pub contracts: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 10_000,
            max_sequences: 50,
            allowed_methods: Vec::new(),
            reuse_probability: 0.75,
            null_probability: 0.05,
            fresh_value_probability: 0.20,
            constructor_fresh_probability: 0.10,
            repeat_probability: 0.05,
            max_collection_len: 20,
            max_string_len: 50,
            max_constructor_depth: 8,
            seed: None,
            call_timeout_ms: None,
            filters: BUILTIN_FILTERS.iter().map(|s| s.to_string()).collect(),
            contracts: BUILTIN_CONTRACTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GeneratorConfig {
    /// Check bounds and that every filter and contract name is a built-in.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_bounds()?;
        if let Some(name) = self
            .filters
            .iter()
            .find(|name| !BUILTIN_FILTERS.contains(&name.as_str()))
        {
            return Err(ConfigError::UnknownFilter(name.clone()));
        }
        if let Some(name) = self
            .contracts
            .iter()
            .find(|name| !BUILTIN_CONTRACTS.contains(&name.as_str()))
        {
            return Err(ConfigError::UnknownContract(name.clone()));
        }
        Ok(())
    }

    /// Probability ranges and run bounds only.
    pub fn validate_bounds(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("reuse_probability", self.reuse_probability),
            ("null_probability", self.null_probability),
            ("fresh_value_probability", self.fresh_value_probability),
            ("constructor_fresh_probability", self.constructor_fresh_probability),
            ("repeat_probability", self.repeat_probability),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }
        if self.time_limit_ms == 0 && self.max_sequences == 0 {
            return Err(ConfigError::Unbounded);
        }
        Ok(())
    }

    pub fn time_limit(&self) -> Option<Duration> {
        (self.time_limit_ms > 0).then(|| Duration::from_millis(self.time_limit_ms))
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

/// A target type with its eligible methods and their usage counters.
#[derive(Debug)]
struct Target {
    name: String,
    methods: Vec<Operation>,
    usage: Vec<u64>,
}

pub struct Generator<C: Catalog> {
    catalog: C,
    targets: Vec<Target>,
    config: GeneratorConfig,
    seed: u64,
    values: ValueGenerator,
    invoker: Invoker,
    pool: ValuePool,
    fingerprints: HashSet<String>,
    filters: FilterPipeline,
    oracle: ContractOracle,
    valid: Vec<Arc<Sequence>>,
    invalid: Vec<Sequence>,
    stats: GenerationStats,
}

impl<C: Catalog> Generator<C> {
    /// Generator over `targets` using the built-in filters and contracts.
    pub fn new<S: AsRef<str>>(
        catalog: C,
        targets: &[S],
        config: GeneratorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::with_registries(
            catalog,
            targets,
            config,
            &FilterRegistry::with_builtins(),
            &ContractRegistry::with_builtins(),
        )
    }

    /// Generator whose filter and contract names resolve through the given
    /// registries.
    pub fn with_registries<S: AsRef<str>>(
        catalog: C,
        targets: &[S],
        config: GeneratorConfig,
        filters: &FilterRegistry,
        contracts: &ContractRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate_bounds()?;
        let filters = FilterPipeline::from_names(filters, &config.filters)?;
        let oracle = ContractOracle::from_names(contracts, &config.contracts)?;
        let targets = resolve_targets(&catalog, targets, &config.allowed_methods)?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let values = ValueGenerator::new(seed, config.max_collection_len, config.max_string_len);
        let invoker = match config.call_timeout() {
            Some(timeout) => Invoker::with_timeout(timeout),
            None => Invoker::inline(),
        };

        Ok(Self {
            catalog,
            targets,
            config,
            seed,
            values,
            invoker,
            pool: ValuePool::new(),
            fingerprints: HashSet::new(),
            filters,
            oracle,
            valid: Vec::new(),
            invalid: Vec::new(),
            stats: GenerationStats::default(),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Names of the eligible methods per target type.
    pub fn eligible_methods(&self) -> BTreeMap<String, Vec<String>> {
        self.targets
            .iter()
            .map(|t| {
                let names = t.methods.iter().map(|op| op.desc().key()).collect();
                (t.name.clone(), names)
            })
            .collect()
    }

    /// Install an extra filter at the end of the pipeline.
    pub fn push_filter(&mut self, filter: Box<dyn SequenceFilter>) {
        self.filters.push(filter);
    }

    /// Run until the time or attempt budget is exhausted.
    pub fn run(mut self) -> GenerationReport {
        let start = Instant::now();
        let time_limit = self.config.time_limit();
        info!(
            seed = self.seed,
            targets = self.targets.len(),
            max_sequences = self.config.max_sequences,
            time_limit_ms = self.config.time_limit_ms,
            "starting generation"
        );

        loop {
            if self.config.max_sequences > 0 && self.stats.attempts >= self.config.max_sequences {
                break;
            }
            if time_limit.is_some_and(|limit| start.elapsed() >= limit) {
                break;
            }
            self.attempt();
        }

        self.stats.elapsed_ms = start.elapsed().as_millis() as u64;
        self.stats.seed = self.seed;
        info!(
            attempts = self.stats.attempts,
            valid = self.valid.len(),
            invalid = self.invalid.len(),
            elapsed_ms = self.stats.elapsed_ms,
            "generation finished"
        );
        GenerationReport {
            valid: self.valid,
            invalid: self.invalid,
            stats: self.stats,
        }
    }

    fn attempt(&mut self) {
        let target = self.values.rng().gen_range(0..self.targets.len());
        if self.targets[target].methods.is_empty() {
            debug!(target = %self.targets[target].name, "no eligible methods");
            self.stats.skipped += 1;
            return;
        }
        self.stats.attempts += 1;
        let id = self.stats.attempts;

        let mut seq = Sequence::new();
        if !self.valid.is_empty() && self.values.rng().gen_bool(self.config.reuse_probability) {
            let pick = self.values.rng().gen_range(0..self.valid.len());
            seq.concat(&self.valid[pick]);
        }

        let op = self.choose_method(target);
        if let Err(abandon) = self.append_calls(&mut seq, &op) {
            debug!(attempt = id, op = %op.desc().key(), reason = %abandon, "attempt abandoned");
            GenerationStats::bump(&mut self.stats.abandoned, abandon.label());
            return;
        }

        seq.set_id(id);
        self.stats.executed += 1;
        let executed = seq.execute(&self.invoker);
        self.classify(seq, executed.is_err());
    }

    /// Usage-weighted choice: weight = (max usage - usage) + 1.
    fn choose_method(&mut self, target: usize) -> Operation {
        let usage = &self.targets[target].usage;
        let max = usage.iter().copied().max().unwrap_or(0);
        let weights: Vec<u64> = usage.iter().map(|u| max - u + 1).collect();
        let total: u64 = weights.iter().sum();
        let mut roll = self.values.rng().gen_range(0..total);
        let mut chosen = weights.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if roll < *w {
                chosen = i;
                break;
            }
            roll -= w;
        }
        let target = &mut self.targets[target];
        target.usage[chosen] += 1;
        target.methods[chosen].clone()
    }

    /// Append `op` at least once, repeating with `repeat_probability`.
    fn append_calls(&mut self, seq: &mut Sequence, op: &Operation) -> Result<(), Abandon> {
        loop {
            let desc = op.desc();
            let mut args = Vec::with_capacity(desc.params.len() + 1);
            if desc.needs_receiver() {
                args.push(self.resolve_receiver(seq, &desc.declaring_type_ref(), 0)?);
            }
            for param in &desc.params {
                let fresh = self.config.fresh_value_probability;
                args.push(self.resolve_argument(seq, param, fresh, 0)?);
            }
            seq.push(Statement::method_call(op.clone(), args));
            if !self.values.rng().gen_bool(self.config.repeat_probability) {
                return Ok(());
            }
        }
    }

    /// Null, fresh value, reuse, then synthesis. Fresh object values are
    /// new constructor calls.
    fn resolve_argument(
        &mut self,
        seq: &mut Sequence,
        ty: &TypeRef,
        fresh_probability: f64,
        depth: usize,
    ) -> Result<Argument, Abandon> {
        if ty.is_reference() && self.values.rng().gen_bool(self.config.null_probability) {
            let idx = seq.push(Statement::constant(Value::Null, ty.clone()));
            return Ok(Argument::Result(idx));
        }
        if (ty.is_literal() || self.is_constructible(ty))
            && self.values.rng().gen_bool(fresh_probability)
        {
            return self.synthesize(seq, ty, depth);
        }
        match self.reuse(seq, ty) {
            Some(arg) => Ok(arg),
            None => self.synthesize(seq, ty, depth),
        }
    }

    /// Receivers are reused or constructed, never null or literal.
    fn resolve_receiver(
        &mut self,
        seq: &mut Sequence,
        ty: &TypeRef,
        depth: usize,
    ) -> Result<Argument, Abandon> {
        match self.reuse(seq, ty) {
            Some(arg) => Ok(arg),
            None => self.synthesize(seq, ty, depth),
        }
    }

    /// A value of type `ty` from the growing sequence, else from the pool.
    fn reuse(&mut self, seq: &mut Sequence, ty: &TypeRef) -> Option<Argument> {
        if let Some(idx) =
            ValuePool::sample_statement_producing(seq, ty, &self.catalog, self.values.rng())
        {
            return Some(Argument::Result(idx));
        }
        let borrowed = self
            .pool
            .sample_sequence_producing(ty, &self.catalog, self.values.rng())
            .cloned()?;
        let idx =
            ValuePool::sample_statement_producing(&borrowed, ty, &self.catalog, self.values.rng())?;
        let offset = seq.concat(&borrowed);
        Some(Argument::Result(offset + idx))
    }

    /// Whether `ty` names a concrete catalog type with a public constructor.
    fn is_constructible(&self, ty: &TypeRef) -> bool {
        ty.object_name()
            .and_then(|name| self.catalog.type_info(name))
            .is_some_and(|info| !info.is_abstract && info.public_constructors().next().is_some())
    }

    /// A literal constant for literal types, a constructor call otherwise.
    fn synthesize(
        &mut self,
        seq: &mut Sequence,
        ty: &TypeRef,
        depth: usize,
    ) -> Result<Argument, Abandon> {
        if let Some(value) = self.values.generate(ty) {
            let idx = seq.push(Statement::constant(value, ty.clone()));
            return Ok(Argument::Result(idx));
        }
        match ty.object_name() {
            Some(name) => self.construct(seq, ty, name, depth),
            None => Err(Abandon::Unsynthesizable(ty.clone())),
        }
    }

    fn construct(
        &mut self,
        seq: &mut Sequence,
        ty: &TypeRef,
        name: &str,
        depth: usize,
    ) -> Result<Argument, Abandon> {
        if depth >= self.config.max_constructor_depth {
            return Err(Abandon::DepthExceeded(ty.clone()));
        }
        let constructors: Vec<Operation> = self
            .catalog
            .type_info(name)
            .filter(|info| !info.is_abstract)
            .map(|info| info.public_constructors().cloned().collect())
            .unwrap_or_default();
        if constructors.is_empty() {
            return Err(Abandon::NoConstructor(ty.clone()));
        }
        let pick = self.values.rng().gen_range(0..constructors.len());
        let ctor = constructors[pick].clone();

        let fresh = self.config.constructor_fresh_probability;
        let mut args = Vec::with_capacity(ctor.desc().params.len());
        for param in &ctor.desc().params {
            args.push(self.resolve_argument(seq, param, fresh, depth + 1)?);
        }
        let idx = seq.push(Statement::constructor_call(ctor, args));
        Ok(Argument::Result(idx))
    }

    fn classify(&mut self, mut seq: Sequence, threw: bool) {
        seq.bind_names();

        if threw {
            self.stats.exceptions += 1;
            if let Some(violation) = self.oracle.check_sequence(&seq) {
                GenerationStats::bump(&mut self.stats.contract_violations, &violation.contract);
                seq.set_violation(violation);
            }
            self.reject(seq, Rejection::Exception);
            return;
        }

        let fingerprint = seq.fingerprint();
        if self.fingerprints.contains(&fingerprint) {
            self.stats.duplicates += 1;
            self.reject(seq, Rejection::DuplicateStructure);
            return;
        }

        let rejected_by = self.filters.first_rejection(&seq);
        if let Some(violation) = self.oracle.check_sequence(&seq) {
            GenerationStats::bump(&mut self.stats.contract_violations, &violation.contract);
            seq.set_violation(violation);
        }

        match rejected_by {
            Some(filter) => {
                GenerationStats::bump(&mut self.stats.filter_rejections, &filter);
                self.reject(seq, Rejection::Filtered { filter });
            }
            None if seq.violation().is_some() => self.reject(seq, Rejection::ContractViolation),
            None => {
                debug!(seq = seq.id(), len = seq.len(), "accepted");
                seq.set_verdict(Verdict::Valid);
                self.fingerprints.insert(fingerprint);
                let seq = Arc::new(seq);
                self.pool.register(Arc::clone(&seq));
                self.valid.push(seq);
            }
        }
    }

    fn reject(&mut self, mut seq: Sequence, rejection: Rejection) {
        debug!(seq = seq.id(), len = seq.len(), ?rejection, "rejected");
        seq.set_verdict(Verdict::Invalid(rejection));
        self.invalid.push(seq);
    }
}

/// Eligible public methods for every target type.
fn resolve_targets<C: Catalog, S: AsRef<str>>(
    catalog: &C,
    names: &[S],
    allowed: &[String],
) -> Result<Vec<Target>, ConfigError> {
    if names.is_empty() {
        return Err(ConfigError::NoTargetTypes);
    }
    let mut targets = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        let info = catalog
            .type_info(name)
            .ok_or_else(|| ConfigError::UnknownType(name.to_string()))?;
        let methods: Vec<Operation> = info
            .public_methods()
            .filter(|op| allowed.is_empty() || allowed.iter().any(|a| *a == op.desc().name))
            .cloned()
            .collect();
        targets.push(Target {
            name: name.to_string(),
            usage: vec![0; methods.len()],
            methods,
        });
    }

    for entry in allowed {
        let known = targets
            .iter()
            .any(|t| t.methods.iter().any(|op| op.desc().name == *entry));
        if !known {
            warn!(method = %entry, "allow-list entry matches no public method of the target types");
        }
    }

    if targets.iter().all(|t| t.methods.is_empty()) {
        return Err(ConfigError::NoEligibleOperations);
    }
    Ok(targets)
}
