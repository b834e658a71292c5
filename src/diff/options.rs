use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How per-element comparisons are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    Sequential,
    Parallel,
    /// Parallel once the number of shared ids reaches the threshold.
    #[default]
    Auto,
}

/// Differ configuration.
///
/// Loadable from TOML; missing keys take their defaults:
///
/// ```toml
/// execution = "auto"
/// parallel_threshold = 2048
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffOptions {
    pub execution: Execution,
    pub parallel_threshold: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            execution: Execution::Auto,
            parallel_threshold: 2048,
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read options file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse options: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DiffOptions {
    pub fn sequential() -> Self {
        Self {
            execution: Execution::Sequential,
            ..Self::default()
        }
    }

    pub fn parallel() -> Self {
        Self {
            execution: Execution::Parallel,
            ..Self::default()
        }
    }

    /// Loads options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(content)?)
    }

    /// Whether `shared` common ids should be compared in parallel.
    pub(crate) fn runs_parallel(&self, shared: usize) -> bool {
        match self.execution {
            Execution::Sequential => false,
            Execution::Parallel => true,
            Execution::Auto => shared >= self.parallel_threshold,
        }
    }
}
