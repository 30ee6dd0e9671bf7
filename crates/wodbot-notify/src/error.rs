//! Notification delivery error types.

use thiserror::Error;

/// Delivery failures. These are logged by the sender and never escalate
/// into a run failure.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level failure reaching Pushover.
    #[error("notification request failed: {0}")]
    Network(String),

    /// Non-success HTTP status from the API.
    #[error("Pushover HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The API accepted the request but rejected the message.
    #[error("Pushover rejected the message: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Network(e.to_string())
    }
}
