//! Suite generation command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use seqgen::config::RunConfig;
use seqgen::demo::{demo_catalog, DEFAULT_TARGETS};
use seqgen::output::{suite_header, write_report, write_suite};
use seqgen_core::{GenerationReport, Generator};

#[derive(Parser, Debug)]
#[command(
    about = "Generate a test suite for one or more target types",
    long_about = "Builds random call sequences over the public methods of the target \
                  types, executes them, and classifies each as valid or invalid. \
                  Valid sequences become regression tests; sequences that raise or \
                  break a contract become failing-behavior tests.\n\n\
                  Settings come from the config document (./seqgen.json if present); \
                  flags override it."
)]
pub struct GenerateCmd {
    /// Target type names (default: TestClass)
    pub targets: Vec<String>,

    /// Config document (JSON)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Time budget in milliseconds (0 = no time bound)
    #[arg(long)]
    pub time_limit_ms: Option<u64>,

    /// Maximum generation attempts (0 = no count bound)
    #[arg(long, short = 'n')]
    pub max_sequences: Option<u64>,

    /// Random seed for reproducibility (default: random)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Probability of extending a previously accepted sequence
    #[arg(long)]
    pub reuse_probability: Option<f64>,

    /// Only exercise methods with this name (repeatable)
    #[arg(long = "allow")]
    pub allowed_methods: Vec<String>,

    /// Filter pipeline in order (repeatable, replaces the configured list)
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Per-call time budget in milliseconds
    #[arg(long)]
    pub call_timeout_ms: Option<u64>,

    /// Root directory for the emitted sources
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Package of the emitted suite
    #[arg(long)]
    pub package: Option<String>,

    /// Class name of the emitted suite
    #[arg(long)]
    pub suite_name: Option<String>,

    /// Also write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the suite to stdout instead of writing it
    #[arg(long)]
    pub stdout: bool,
}

impl GenerateCmd {
    /// Config document with command-line overrides applied.
    pub fn resolve_config(&self) -> Result<RunConfig> {
        let cwd = std::env::current_dir().context("Failed to read working directory")?;
        let mut config = RunConfig::load_or_default(self.config.as_deref(), &cwd)?;

        if !self.targets.is_empty() {
            config.targets = self.targets.clone();
        }
        let generator = &mut config.generator;
        if let Some(ms) = self.time_limit_ms {
            generator.time_limit_ms = ms;
        }
        if let Some(n) = self.max_sequences {
            generator.max_sequences = n;
        }
        if let Some(seed) = self.seed {
            generator.seed = Some(seed);
        }
        if let Some(p) = self.reuse_probability {
            generator.reuse_probability = p;
        }
        if !self.allowed_methods.is_empty() {
            generator.allowed_methods = self.allowed_methods.clone();
        }
        if !self.filters.is_empty() {
            generator.filters = self.filters.clone();
        }
        if let Some(ms) = self.call_timeout_ms {
            generator.call_timeout_ms = Some(ms);
        }
        if let Some(dir) = &self.out_dir {
            config.out_dir = dir.clone();
        }
        if let Some(package) = &self.package {
            config.package = package.clone();
        }
        if let Some(name) = &self.suite_name {
            config.suite_name = name.clone();
        }
        if let Some(path) = &self.report {
            config.report = Some(path.clone());
        }
        Ok(config)
    }

    pub fn execute(&self, json_output: bool, verbose: bool) -> Result<()> {
        let config = self.resolve_config()?;
        let targets: Vec<String> = if config.targets.is_empty() {
            DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect()
        } else {
            config.targets.clone()
        };

        let generator = Generator::new(demo_catalog(), &targets, config.generator.clone())
            .context("Invalid generator configuration")?;
        let report = generator.run();

        if let Some(path) = &config.report {
            write_report(&report, path)?;
        }

        if self.stdout {
            print!(
                "{}",
                report.render_suite(&suite_header(&config, report.stats.seed))
            );
            return Ok(());
        }

        let suite = write_suite(&report, &config)?;
        if json_output {
            let summary = serde_json::json!({
                "targets": targets,
                "suite": suite,
                "valid": report.valid.len(),
                "invalid": report.invalid.len(),
                "stats": report.stats,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_report(&report, &targets, &suite, verbose);
        }
        Ok(())
    }
}

fn print_report(report: &GenerationReport, targets: &[String], suite: &Path, verbose: bool) {
    let stats = &report.stats;
    println!("Targets: {}", targets.join(", "));
    println!();
    println!(
        "Results ({} attempts, seed: {}, {}ms):",
        stats.attempts, stats.seed, stats.elapsed_ms
    );

    let executed = stats.executed.max(1);
    let pct = |n: usize| n as f64 / executed as f64 * 100.0;
    println!(
        "  Valid:          {:>6} ({:.1}%)",
        report.valid.len(),
        pct(report.valid.len())
    );
    println!(
        "  Invalid:        {:>6} ({:.1}%)",
        report.invalid.len(),
        pct(report.invalid.len())
    );
    println!("    exceptions:   {:>6}", stats.exceptions);
    println!("    duplicates:   {:>6}", stats.duplicates);
    for (filter, count) in &stats.filter_rejections {
        println!("    {filter}: {count}");
    }
    if !stats.contract_violations.is_empty() {
        println!("  Contract violations:");
        for (contract, count) in &stats.contract_violations {
            println!("    {contract}: {count}");
        }
    }
    if stats.abandoned_total() > 0 || stats.skipped > 0 {
        println!(
            "  Abandoned:      {:>6}  Skipped: {}",
            stats.abandoned_total(),
            stats.skipped
        );
        for (reason, count) in &stats.abandoned {
            println!("    {reason}: {count}");
        }
    }

    if verbose {
        println!();
        println!("Valid sequences:");
        for seq in &report.valid {
            println!("  #{:<5} {}", seq.id(), seq.fingerprint());
        }
    }

    println!();
    println!(
        "Wrote {} valid and {} invalid sequences to {}",
        report.valid.len(),
        report.invalid.len(),
        suite.display()
    );
}
