#![allow(dead_code)]
//! Shared helpers for the integration tests.

use seqgen::demo::demo_catalog;
use seqgen_core::{GenerationReport, Generator, GeneratorConfig, Rejection};

/// Count-bounded, seeded config with no time bound.
pub fn bounded_config(attempts: u64, seed: u64) -> GeneratorConfig {
    GeneratorConfig {
        time_limit_ms: 0,
        max_sequences: attempts,
        seed: Some(seed),
        ..GeneratorConfig::default()
    }
}

/// Run the generator over the demo catalog.
pub fn run_demo(targets: &[&str], config: GeneratorConfig) -> GenerationReport {
    Generator::new(demo_catalog(), targets, config)
        .expect("demo targets are valid")
        .run()
}

/// Whether any invalid sequence is tagged with `contract`.
pub fn tagged_with(report: &GenerationReport, contract: &str) -> bool {
    report
        .invalid
        .iter()
        .any(|seq| seq.violated_contract() == Some(contract))
}

pub fn count_rejections(report: &GenerationReport, rejection: &Rejection) -> usize {
    report
        .invalid
        .iter()
        .filter(|seq| seq.rejection() == Some(rejection))
        .count()
}
