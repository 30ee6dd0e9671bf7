//! Ollama chat client for the selection request.

use tracing::{debug, info};

use crate::api::{ChatMessage, ChatOptions, ChatRequest, ChatResponse};
use crate::decision::SelectionDecision;
use crate::error::LlmError;

/// Client for the external decision-maker.
///
/// One chat call per run: the configured system prompt plus the rendered
/// roster, with JSON output and temperature 0 so the answer is a
/// deterministic, machine-readable decision.
pub struct SelectionClient {
    host: String,
    model: String,
    system_prompt: String,
    client: reqwest::Client,
}

impl SelectionClient {
    pub fn new(
        host: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Ask the model which class to book, given the rendered roster table.
    ///
    /// `count` is the number of roster lines, used only for logging; bounds
    /// checking against the roster is the caller's job.
    pub async fn select_class(
        &self,
        roster: &str,
        count: usize,
    ) -> Result<SelectionDecision, LlmError> {
        if count == 0 {
            return Err(LlmError::NoCandidates);
        }

        info!("Sending {count} classes to the model for selection");
        debug!("Roster:\n{roster}");

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Here are the available classes:\n\n{roster}\n\nWhich class should I book?"
                    ),
                },
            ],
            stream: false,
            format: Some("json".to_string()),
            options: Some(ChatOptions { temperature: 0.0 }),
        };

        let url = format!("{}/api/chat", self.host.trim_end_matches('/'));
        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, message });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        debug!("Model raw response: {}", body.message.content);
        let decision = SelectionDecision::from_json(&body.message.content)?;

        info!("Model selected class #{}", decision.selected_index);
        info!("Reasoning: {}", decision.reasoning);
        info!("Notify user: {}", decision.notify_user);
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn chat_body(content: &str) -> String {
        serde_json::json!({
            "model": "qwen3:8b",
            "message": {"role": "assistant", "content": content},
            "done": true,
        })
        .to_string()
    }

    #[tokio::test]
    async fn returns_parsed_decision() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/chat"))
            .and(matchers::body_string_contains("\"temperature\":0"))
            .and(matchers::body_string_contains("\"format\":\"json\""))
            .respond_with(ResponseTemplate::new(200).set_body_string(chat_body(
                r#"{"selected_index": 1, "reasoning": "only bookable slot", "notify_user": false}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = SelectionClient::new(server.uri(), "qwen3:8b", "pick a class");
        let decision = client.select_class("00: 6:00 AM | CrossFit", 2).await.unwrap();
        assert_eq!(decision.selected_index, 1);
        assert!(!decision.notify_user);
    }

    #[tokio::test]
    async fn roster_is_embedded_in_the_user_message() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/chat"))
            .and(matchers::body_string_contains("Here are the available classes"))
            .and(matchers::body_string_contains("Coach: Alex"))
            .respond_with(ResponseTemplate::new(200).set_body_string(chat_body(
                r#"{"selected_index": 0, "reasoning": "x"}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = SelectionClient::new(server.uri(), "qwen3:8b", "prompt");
        client
            .select_class("00: 6:00 AM | CrossFit | Coach: Alex", 1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn malformed_answer_is_a_hard_failure() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(chat_body("the 6am one, probably")),
            )
            // One request only: malformed JSON is never retried.
            .expect(1)
            .mount(&server)
            .await;

        let client = SelectionClient::new(server.uri(), "qwen3:8b", "prompt");
        let err = client.select_class("00: 6:00 AM", 1).await.unwrap_err();
        assert!(matches!(err, LlmError::MalformedDecision { .. }));
    }

    #[tokio::test]
    async fn api_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .expect(1)
            .mount(&server)
            .await;

        let client = SelectionClient::new(server.uri(), "qwen3:8b", "prompt");
        let err = client.select_class("00: 6:00 AM", 1).await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("model not loaded"));
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_roster_never_reaches_the_wire() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = SelectionClient::new(server.uri(), "qwen3:8b", "prompt");
        let err = client.select_class("", 0).await.unwrap_err();
        assert!(matches!(err, LlmError::NoCandidates));
    }
}
