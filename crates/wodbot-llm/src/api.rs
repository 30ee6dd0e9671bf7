//! Ollama chat API types.

use serde::{Deserialize, Serialize};

/// Chat request body for `/api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    /// Ask the model to emit structured JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ChatOptions>,
}

/// One chat message.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Sampling options.
#[derive(Debug, Serialize)]
pub struct ChatOptions {
    pub temperature: f32,
}

/// Chat response body.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_absent_options() {
        let req = ChatRequest {
            model: "qwen3:8b".to_string(),
            messages: vec![],
            stream: false,
            format: None,
            options: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("format"));
        assert!(!json.contains("options"));
    }

    #[test]
    fn parses_chat_response() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"model":"qwen3:8b","message":{"role":"assistant","content":"hi"},"done":true}"#,
        )
        .unwrap();
        assert_eq!(resp.message.content, "hi");
        assert!(resp.done);
    }
}
