//! Browser automation error types.

use thiserror::Error;

/// Errors from Chrome launch, the CDP connection, or page operations.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No Chrome executable was found on this machine.
    #[error("Chrome executable not found; install Chrome or Chromium")]
    ChromeNotFound,

    /// Chrome was found but did not start.
    #[error("failed to launch Chrome: {0}")]
    LaunchFailed(String),

    /// The CDP WebSocket could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// WebSocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Error response from the protocol itself.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error during endpoint discovery.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Navigation did not complete.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// An evaluated script threw.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// A bounded wait expired.
    #[error("timeout: {0}")]
    Timeout(String),

    /// A locate operation found nothing within its wait budget.
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// The page session is gone.
    #[error("session closed")]
    SessionClosed,

    /// The browser answered with something unexpected.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Filesystem error while saving a capture.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for BrowserError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        BrowserError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for BrowserError {
    fn from(e: reqwest::Error) -> Self {
        BrowserError::Http(e.to_string())
    }
}
