//! Builder driving region updates from a build script.

use std::path::PathBuf;

use anyhow::{Context, Result};
use testable::{TestableConfig, TestableMacro, WriteOutcome, discover_sources, update_file};

/// Builder for configuring and running the test-hook generator.
#[derive(Debug, Default)]
pub struct HooksGenerator {
    scan_paths: Vec<PathBuf>,
    config: Option<TestableConfig>,
    config_file: Option<PathBuf>,
    check: bool,
}

/// Counts from one generator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub files: usize,
    pub types: usize,
    pub updated: usize,
    pub stale: usize,
}

impl HooksGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file or directory to scan for `@Testable` types.
    ///
    /// Can be called multiple times. Defaults to the current directory.
    pub fn scan_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scan_paths.push(path.into());
        self
    }

    /// Use this configuration instead of looking for `testable.toml`.
    pub fn config(mut self, config: TestableConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the configuration from this file.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Fail instead of writing when a region is out of date.
    pub fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    /// Run the generator.
    ///
    /// Files are only written when their content changes, so an up-to-date
    /// tree does not trigger recompilation.
    pub fn run(self) -> Result<BuildSummary> {
        let scan_paths = if self.scan_paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.scan_paths
        };

        let config = match (self.config, &self.config_file) {
            (_, Some(path)) => {
                TestableConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))?
            }
            (Some(config), None) => config,
            (None, None) => {
                TestableConfig::discover_or_default(&scan_paths[0])
                    .context("Failed to load testable.toml")?
                    .0
            }
        };
        let exclude = config.exclude_patterns()?;
        let generator = TestableMacro::new(config.expansion);

        let mut summary = BuildSummary::default();
        let mut failures = Vec::new();
        let mut stale = Vec::new();

        for path in &scan_paths {
            println!("cargo:rerun-if-changed={}", path.display());
            let files =
                discover_sources(path, &exclude).with_context(|| format!("Failed to scan {}", path.display()))?;

            for file in files {
                let report = update_file(&file.path, &generator, self.check)
                    .with_context(|| format!("Failed to update {}", file.path.display()))?;
                summary.files += 1;
                summary.types += report.expansions.iter().filter(|expansion| expansion.is_ok()).count();

                for expansion in &report.expansions {
                    for diagnostic in &expansion.diagnostics {
                        log::debug!("{}:{diagnostic}", file.relative_path);
                    }
                    if let Err(err) = &expansion.result {
                        failures.push(format!("{}: {err}", file.relative_path));
                    }
                }
                match report.outcome {
                    WriteOutcome::Updated => summary.updated += 1,
                    WriteOutcome::Stale => {
                        summary.stale += 1;
                        stale.push(file.path.display().to_string());
                    }
                    WriteOutcome::Unchanged => {}
                }
            }
        }

        if !failures.is_empty() {
            anyhow::bail!("testable-build: failed to expand:\n  {}", failures.join("\n  "));
        }
        if !stale.is_empty() {
            anyhow::bail!("testable-build: out-of-date test hooks in:\n  {}", stale.join("\n  "));
        }

        eprintln!(
            "testable-build: {} type(s) in {} file(s), {} updated",
            summary.types, summary.files, summary.updated
        );
        Ok(summary)
    }
}
