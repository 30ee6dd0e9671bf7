//! LLM client error types.

use thiserror::Error;

/// Errors from the selection request.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure reaching the model endpoint.
    #[error("LLM request failed: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status.
    #[error("LLM API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The model's answer was not the JSON object we asked for.
    /// Never retried; a malformed decision is a hard failure.
    #[error("LLM returned invalid JSON: {reason}; raw response: {raw}")]
    MalformedDecision { reason: String, raw: String },

    /// Nothing was provided to choose from.
    #[error("no classes provided for selection")]
    NoCandidates,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Network(e.to_string())
    }
}
