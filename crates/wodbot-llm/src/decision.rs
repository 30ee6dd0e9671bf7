//! The externally supplied answer to "which class to book".

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Decision payload returned by the model.
///
/// `selected_index` is validated by the caller against the extracted
/// roster; nothing here is clamped or defaulted except the notify flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionDecision {
    pub selected_index: i64,
    pub reasoning: String,
    #[serde(default)]
    pub notify_user: bool,
}

impl SelectionDecision {
    /// Parse the model's raw JSON answer. Malformed output is a hard
    /// failure; the raw text is carried for the log.
    pub fn from_json(raw: &str) -> Result<Self, LlmError> {
        serde_json::from_str(raw).map_err(|e| LlmError::MalformedDecision {
            reason: e.to_string(),
            raw: raw.to_string(),
        })
    }
}
