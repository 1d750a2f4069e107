//! Report types for generation runs.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

use crate::render::{JUnitRenderer, SuiteHeader, TestRenderer};
use crate::sequence::{Sequence, Verdict, Violation};

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation attempts started, including abandoned ones. Iterations
    /// that drew a target without eligible operations are not counted.
    pub attempts: u64,
    /// Iterations whose chosen target type had no eligible operation.
    pub skipped: u64,
    /// Abandoned attempts grouped by reason.
    pub abandoned: BTreeMap<String, u64>,
    /// Sequences that were built and executed.
    pub executed: u64,
    /// Executions that stopped on a raised fault.
    pub exceptions: u64,
    /// Sequences rejected for a structural fingerprint seen before.
    pub duplicates: u64,
    /// Rejections grouped by filter name.
    pub filter_rejections: BTreeMap<String, u64>,
    /// Violations grouped by contract name.
    pub contract_violations: BTreeMap<String, u64>,
    pub elapsed_ms: u64,
    /// Random seed used.
    pub seed: u64,
}

impl GenerationStats {
    pub fn abandoned_total(&self) -> u64 {
        self.abandoned.values().sum()
    }

    pub(crate) fn bump(map: &mut BTreeMap<String, u64>, key: &str) {
        *map.entry(key.to_string()).or_insert(0) += 1;
    }
}

/// Flat, serializable view of one classified sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceSummary {
    pub id: u64,
    pub fingerprint: String,
    /// Rendered statements, in execution order.
    pub statements: Vec<String>,
    pub verdict: Option<Verdict>,
    pub threw_exception: bool,
    /// Index of the statement that raised, if any.
    pub failing_statement: Option<usize>,
    pub fault: Option<String>,
    pub violation: Option<Violation>,
}

impl SequenceSummary {
    pub fn from_sequence(seq: &Sequence) -> Self {
        let statements = seq.statements();
        Self {
            id: seq.id(),
            fingerprint: seq.fingerprint(),
            statements: statements
                .iter()
                .enumerate()
                .map(|(i, s)| s.render(&statements[..i]))
                .collect(),
            verdict: seq.verdict().cloned(),
            threw_exception: seq.threw_exception(),
            failing_statement: seq.failure().map(|f| f.statement),
            fault: seq.failure().map(|f| f.fault.to_string()),
            violation: seq.violation().cloned(),
        }
    }
}

/// Result of a generation run.
///
/// Serializes with sequences flattened into [`SequenceSummary`] values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    /// Accepted sequences in acceptance order.
    #[serde(serialize_with = "summarize")]
    pub valid: Vec<Arc<Sequence>>,
    /// Rejected sequences in classification order.
    #[serde(serialize_with = "summarize")]
    pub invalid: Vec<Sequence>,
    pub stats: GenerationStats,
}

impl GenerationReport {
    pub fn valid_summaries(&self) -> Vec<SequenceSummary> {
        self.valid
            .iter()
            .map(|s| SequenceSummary::from_sequence(s))
            .collect()
    }

    pub fn invalid_summaries(&self) -> Vec<SequenceSummary> {
        self.invalid.iter().map(SequenceSummary::from_sequence).collect()
    }

    /// Render every sequence into one suite, valid cases first.
    pub fn render_suite(&self, header: &SuiteHeader) -> String {
        self.render_suite_with(&JUnitRenderer::default(), header)
    }

    pub fn render_suite_with<R: TestRenderer>(&self, renderer: &R, header: &SuiteHeader) -> String {
        let valid: Vec<&Sequence> = self.valid.iter().map(|s| s.as_ref()).collect();
        let invalid: Vec<&Sequence> = self.invalid.iter().collect();
        renderer.render_suite(header, &valid, &invalid)
    }
}

#[allow(clippy::ptr_arg)]
fn summarize<S, T>(sequences: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Borrow<Sequence>,
{
    serializer.collect_seq(
        sequences
            .iter()
            .map(|s| SequenceSummary::from_sequence(s.borrow())),
    )
}
