//! `testable.toml` project configuration.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expansion::ExpansionOptions;

pub const CONFIG_FILE: &str = "testable.toml";

/// Configuration written by `testable init`.
pub const DEFAULT_CONFIG: &str = r#"# testable configuration

[expansion]
# "exact" matches modifier names against the lists below;
# "substring" accepts any modifier containing one of them.
modifier_matching = "exact"
qualifying_modifiers = ["private", "fileprivate"]
static_modifiers = ["static", "class"]
# "omit" calls f(value) for `_ value` parameters, "wildcard" calls f(_: value).
argument_labels = "omit"
# "placeholder" forwards untyped properties as `placeholder_type`, "reject" fails.
missing_type = "placeholder"
placeholder_type = "Any"
build_flag = "DEBUG"
indent_width = 4
warn_unsupported = true

[generate]
# Regular expressions matched against paths relative to the scanned root.
exclude = ["(^|/)\\.build/", "(^|/)Pods/"]
"#;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid testable.toml: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("indent_width must be at least 1")]
    ZeroIndent,

    #[error("build_flag must not be empty")]
    EmptyBuildFlag,

    #[error("qualifying_modifiers must name at least one modifier")]
    NoQualifyingModifiers,

    #[error("invalid exclude pattern '{pattern}': {source}")]
    ExcludePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestableConfig {
    pub expansion: ExpansionOptions,
    pub generate: GenerateSettings,
}

/// Discovery exclusions used when `exclude` is not configured.
pub const DEFAULT_EXCLUDE: &[&str] = &["(^|/)\\.build/", "(^|/)Pods/"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSettings {
    /// Path patterns skipped during discovery.
    pub exclude: Vec<String>,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            exclude: DEFAULT_EXCLUDE.iter().map(|pattern| (*pattern).to_owned()).collect(),
        }
    }
}

impl TestableConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: TestableConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Closest `testable.toml` in `start` or one of its ancestors.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Load the closest configuration, or the defaults when there is none.
    pub fn discover_or_default(start: &Path) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match Self::discover(start) {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let expansion = &self.expansion;
        if expansion.indent_width == 0 {
            return Err(ConfigError::ZeroIndent);
        }
        if expansion.build_flag.trim().is_empty() {
            return Err(ConfigError::EmptyBuildFlag);
        }
        if expansion.qualifying_modifiers.is_empty() {
            return Err(ConfigError::NoQualifyingModifiers);
        }
        self.exclude_patterns()?;
        Ok(())
    }

    pub fn exclude_patterns(&self) -> Result<Vec<Regex>, ConfigError> {
        self.generate
            .exclude
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::ExcludePattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::MissingType;
    use crate::scanner::ModifierMatching;
    use crate::synth::ArgumentLabels;

    #[test]
    fn test_default_template_matches_defaults() {
        let config = TestableConfig::from_toml_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, TestableConfig::default());
        assert_eq!(config.generate.exclude, DEFAULT_EXCLUDE);
        assert!(config.exclude_patterns().unwrap()[0].is_match("App/.build/checkouts/x.swift"));
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(TestableConfig::from_toml_str("").unwrap(), TestableConfig::default());
    }

    #[test]
    fn test_exclude_can_be_cleared() {
        let config = TestableConfig::from_toml_str("[generate]\nexclude = []\n").unwrap();
        assert!(config.generate.exclude.is_empty());
        let config = TestableConfig::from_toml_str("[generate]\n").unwrap();
        assert_eq!(config.generate, GenerateSettings::default());
    }

    #[test]
    fn test_partial_override() {
        let config = TestableConfig::from_toml_str(
            "[expansion]\nargument_labels = \"wildcard\"\nmissing_type = \"reject\"\nmodifier_matching = \"substring\"\n",
        )
        .unwrap();
        assert_eq!(config.expansion.argument_labels, ArgumentLabels::Wildcard);
        assert_eq!(config.expansion.missing_type, MissingType::Reject);
        assert_eq!(config.expansion.modifier_matching, ModifierMatching::Substring);
        assert_eq!(config.expansion.build_flag, "DEBUG");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            TestableConfig::from_toml_str("[expansion]\nindent_width = 0\n"),
            Err(ConfigError::ZeroIndent)
        ));
        assert!(matches!(
            TestableConfig::from_toml_str("[expansion]\nbuild_flag = \" \"\n"),
            Err(ConfigError::EmptyBuildFlag)
        ));
        assert!(matches!(
            TestableConfig::from_toml_str("[generate]\nexclude = [\"(\"]\n"),
            Err(ConfigError::ExcludePattern { .. })
        ));
        assert!(matches!(
            TestableConfig::from_toml_str("[expansion]\nargument_labels = \"sometimes\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_discover_walks_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Sources").join("App");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(TestableConfig::discover(&nested), None);

        std::fs::write(dir.path().join(CONFIG_FILE), "[expansion]\nindent_width = 2\n").unwrap();
        assert_eq!(TestableConfig::discover(&nested), Some(dir.path().join(CONFIG_FILE)));

        let (config, path) = TestableConfig::discover_or_default(&nested).unwrap();
        assert_eq!(config.expansion.indent_width, 2);
        assert!(path.is_some());
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = toml::to_string_pretty(&TestableConfig::default()).unwrap();
        assert!(toml_str.contains("modifier_matching"));
        assert!(toml_str.contains("[generate]"));
    }
}
