//! Writing generated suites and run reports to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use seqgen_core::{GenerationReport, SuiteHeader};

use crate::config::RunConfig;

pub fn suite_header(config: &RunConfig, seed: u64) -> SuiteHeader {
    SuiteHeader {
        package: config.package.clone(),
        class_name: config.suite_name.clone(),
        banner: Some(format!(
            "Generated by seqgen at {} (seed {seed})",
            chrono::Utc::now().to_rfc3339()
        )),
    }
}

/// Render the suite and write it to [`RunConfig::suite_path`].
pub fn write_suite(report: &GenerationReport, config: &RunConfig) -> Result<PathBuf> {
    let path = config.suite_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let source = report.render_suite(&suite_header(config, report.stats.seed));
    std::fs::write(&path, source)
        .with_context(|| format!("Failed to write suite {}", path.display()))?;
    info!(path = %path.display(), "wrote suite");
    Ok(path)
}

/// Write the JSON run report.
pub fn write_report(report: &GenerationReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgen_core::{Generator, GeneratorConfig};

    use crate::demo::demo_catalog;

    fn small_report() -> GenerationReport {
        let config = GeneratorConfig {
            time_limit_ms: 0,
            max_sequences: 15,
            seed: Some(5),
            ..Default::default()
        };
        Generator::new(demo_catalog(), &["TestClass"], config)
            .unwrap()
            .run()
    }

    #[test]
    fn test_write_suite_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            out_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let path = write_suite(&small_report(), &config).unwrap();
        assert_eq!(path, dir.path().join("com/demo/GeneratedTests.java"));
        let source = std::fs::read_to_string(path).unwrap();
        assert!(source.contains("// Generated by seqgen"));
        assert!(source.contains("package com.demo;"));
        assert!(source.contains("public class GeneratedTests {"));
    }

    #[test]
    fn test_write_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/run.json");
        write_report(&small_report(), &path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["stats"]["seed"], 5);
        assert_eq!(json["stats"]["attempts"], 15);
        assert!(json["valid"].is_array());
    }
}
