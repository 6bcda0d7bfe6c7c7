//! Plan loading errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading a plan.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The plan file could not be read.
    #[error("failed to read plan '{path}': {source}")]
    ReadPlan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The plan is not valid YAML or does not match the plan schema.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Same as [`ConfigError::Parse`], for a plan read from disk.
    #[error("YAML parse error in '{path}': {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The plan has no operations.
    #[error("plan '{0}' has no operations")]
    EmptyPlan(String),

    /// A required field is missing or blank.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// An operation is configured in a way that can never succeed.
    #[error("invalid operation {index} ('{kind}'): {reason}")]
    InvalidOperation {
        index: usize,
        kind: String,
        reason: String,
    },
}
