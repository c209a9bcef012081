//! Configuration schema (schemadrift.toml)

use serde::{Deserialize, Serialize};
use crate::change::ChangeSeverity;

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Colored, human-readable listing
    #[default]
    Text,

    /// The result envelope as pretty JSON
    Json,
}

/// Columns whose changes are dropped from the report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IgnoreRules {
    /// Qualified column-name patterns (`*` wildcard)
    #[serde(default)]
    pub columns: Vec<String>,
}

impl IgnoreRules {
    /// Check if a qualified column name matches any ignore pattern
    pub fn is_column_ignored(&self, qualified_name: &str) -> bool {
        self.columns.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, qualified_name)
            } else {
                pattern == qualified_name
            }
        })
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Minimum overall severity that fails a check
    #[serde(default = "default_fail_on")]
    pub fail_on: ChangeSeverity,

    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub ignore: IgnoreRules,
}

fn default_fail_on() -> ChangeSeverity {
    ChangeSeverity::Breaking
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fail_on: default_fail_on(),
            format: OutputFormat::default(),
            ignore: IgnoreRules::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Check if an overall severity should fail the check
    pub fn fails(&self, severity: ChangeSeverity) -> bool {
        severity >= self.fail_on
    }
}

/// Simple glob matching (single `*` wildcard)
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" || pattern == "**" {
        return true;
    }

    if let Some(star_pos) = pattern.find('*') {
        let prefix = &pattern[..star_pos];
        let suffix = &pattern[star_pos + 1..];

        text.len() >= prefix.len() + suffix.len()
            && text.starts_with(prefix)
            && text.ends_with(suffix)
    } else {
        pattern == text
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
