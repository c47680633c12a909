use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use testable::{TestableConfig, TestableMacro};

/// Project context for testable operations
pub struct ProjectContext {
    /// Directory the command runs in
    pub working_dir: PathBuf,
    /// Configuration file in use, if any
    pub config_path: Option<PathBuf>,
    /// Loaded configuration, defaults when no file exists
    pub config: TestableConfig,
}

impl ProjectContext {
    /// Load context from the current directory, honouring an explicit
    /// `--config` path.
    pub fn find(config_override: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::find_from(&current_dir, config_override)
    }

    /// Load context starting from the given directory
    pub fn find_from(start: &Path, config_override: Option<&Path>) -> Result<Self> {
        let (config, config_path) = match config_override {
            Some(path) => {
                let config = TestableConfig::load(path)
                    .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
                (config, Some(path.to_path_buf()))
            }
            None => TestableConfig::discover_or_default(start).context("Failed to load testable.toml")?,
        };

        Ok(Self {
            working_dir: start.to_path_buf(),
            config_path,
            config,
        })
    }

    /// Generator configured from the project settings
    pub fn generator(&self) -> TestableMacro {
        TestableMacro::new(self.config.expansion.clone())
    }

    /// Path shown to the user: relative to the working directory when possible
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.working_dir)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testable::CONFIG_FILE;

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ProjectContext::find_from(dir.path(), None).unwrap();
        assert!(ctx.config_path.is_none());
        assert_eq!(ctx.config, TestableConfig::default());
    }

    #[test]
    fn test_explicit_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[expansion]\nbuild_flag = \"TESTING\"\n").unwrap();

        let ctx = ProjectContext::find_from(dir.path(), Some(&path)).unwrap();
        assert_eq!(ctx.config.expansion.build_flag, "TESTING");
        assert_eq!(ctx.generator().options().build_flag, "TESTING");
    }

    #[test]
    fn test_discovered_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[expansion]\nindent_width = 2\n").unwrap();
        let ctx = ProjectContext::find_from(dir.path(), None).unwrap();
        assert_eq!(ctx.config.expansion.indent_width, 2);
        assert_eq!(ctx.display_path(&dir.path().join("A.swift")), "A.swift");
    }
}
