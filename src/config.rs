//! Run configuration document.
//!
//! A JSON document carrying the generator settings (flattened, so a bare
//! `{"filters": [...]}` is a valid document) plus where the suite goes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use seqgen_core::GeneratorConfig;

/// Looked up in the working directory when no document is given.
pub const DEFAULT_CONFIG_FILE: &str = "seqgen.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Target type names; empty means the demo defaults.
    pub targets: Vec<String>,
    /// Package of the emitted suite.
    pub package: String,
    pub suite_name: String,
    /// Root of the emitted sources; the package path is appended.
    pub out_dir: PathBuf,
    /// Where to write the JSON run report, if anywhere.
    pub report: Option<PathBuf>,
    #[serde(flatten)]
    pub generator: GeneratorConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            package: "com.demo".into(),
            suite_name: "GeneratedTests".into(),
            out_dir: PathBuf::from("target/generated-sources"),
            report: None,
            generator: GeneratorConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load a document from a file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        serde_json::from_str(data).context("Failed to parse config document")
    }

    /// Load `path` if given, else `seqgen.json` in `dir` if present, else defaults.
    pub fn load_or_default(path: Option<&Path>, dir: &Path) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = dir.join(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(&fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// `<out_dir>/<package path>/<suite_name>.java`
    pub fn suite_path(&self) -> PathBuf {
        let mut path = self.out_dir.clone();
        for segment in self.package.split('.').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(format!("{}.java", self.suite_name));
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_only_document() {
        let config =
            RunConfig::parse(r#"{"filters": ["ExceptionFilter", "NullFilter"]}"#).unwrap();
        assert_eq!(config.generator.filters, vec!["ExceptionFilter", "NullFilter"]);
        assert_eq!(config.generator.max_sequences, 50);
        assert_eq!(config.suite_name, "GeneratedTests");
    }

    #[test]
    fn test_full_document() {
        let config = RunConfig::parse(
            r#"{
                "targets": ["Counter", "Shape"],
                "package": "org.example.gen",
                "suite_name": "CounterTests",
                "out_dir": "out",
                "time_limit_ms": 500,
                "seed": 42,
                "allowed_methods": ["add"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.targets, vec!["Counter", "Shape"]);
        assert_eq!(config.generator.seed, Some(42));
        assert_eq!(config.generator.time_limit_ms, 500);
        assert_eq!(
            config.suite_path(),
            PathBuf::from("out/org/example/gen/CounterTests.java")
        );
    }

    #[test]
    fn test_malformed_document() {
        let err = RunConfig::parse(r#"{"reuse_probability": "high"}"#).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            RunConfig::load_or_default(None, dir.path()).unwrap(),
            RunConfig::default()
        );
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), r#"{"max_sequences": 3}"#).unwrap();
        let config = RunConfig::load_or_default(None, dir.path()).unwrap();
        assert_eq!(config.generator.max_sequences, 3);
        assert!(RunConfig::load_or_default(Some(&dir.path().join("missing.json")), dir.path())
            .is_err());
    }
}
