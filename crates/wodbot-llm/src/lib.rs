//! Ollama-backed class selection.
//!
//! One chat request per run: system prompt plus the rendered roster table,
//! asking for JSON output at temperature 0. The answer is parsed into a
//! [`SelectionDecision`]; bounds checking against the roster belongs to the
//! caller.

mod api;
mod client;
mod decision;
mod error;

pub use client::SelectionClient;
pub use decision::SelectionDecision;
pub use error::LlmError;
