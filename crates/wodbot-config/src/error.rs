//! Configuration error types.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was present but could not be parsed.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Validation found one or more problems.
    #[error("configuration invalid: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// The system prompt file could not be read.
    #[error("failed to read system prompt {path}: {source}")]
    PromptUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
