//! Run-level error taxonomy.

use thiserror::Error;

use wodbot_config::ConfigError;
use wodbot_llm::LlmError;

/// Classified failure for one run.
///
/// Every variant is fatal: a component failure aborts the run, is caught
/// once at the orchestrator boundary, turned into an error notification,
/// and mapped to exit code 1. Only login carries an internal retry.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Both login flows exhausted after one reload-and-retry.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The target date cell (or the calendar itself) could not be reached.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The rendered day view yielded no class rows.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The external decision was malformed or referenced a class that does
    /// not exist. Never clamped, never defaulted.
    #[error("class selection rejected: {0}")]
    Selection(String),

    /// The booking click or its confirmation failed. Never retried: the
    /// remote system may already have registered the attempt.
    #[error("booking failed: {0}")]
    Booking(String),
}

impl From<LlmError> for RunError {
    fn from(e: LlmError) -> Self {
        RunError::Selection(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_failures_classify_as_selection_errors() {
        let err = RunError::from(LlmError::MalformedDecision {
            reason: "expected value".to_string(),
            raw: "maybe the 6am one".to_string(),
        });
        assert!(matches!(err, RunError::Selection(_)));
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn messages_carry_the_classified_cause() {
        let err = RunError::Navigation("no calendar cell found for 11/14".to_string());
        assert_eq!(
            err.to_string(),
            "navigation failed: no calendar cell found for 11/14"
        );
    }
}
