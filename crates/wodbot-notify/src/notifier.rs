//! Pushover delivery and the run's message templates.

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::NotifyError;

const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// How long one delivery attempt may take.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pushover message priority scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Silent,
    Quiet,
    Normal,
    High,
    Emergency,
}

impl Priority {
    /// The ordinal the API expects.
    pub fn level(self) -> i8 {
        match self {
            Priority::Silent => -2,
            Priority::Quiet => -1,
            Priority::Normal => 0,
            Priority::High => 1,
            Priority::Emergency => 2,
        }
    }
}

#[derive(Debug, Clone)]
struct ApiKeys {
    user_key: String,
    app_token: String,
}

/// Body of a Pushover API response.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: i32,
    #[serde(default)]
    errors: Vec<String>,
}

/// Pushover notification sender.
///
/// Delivery failure is logged and reported as `false`; it never fails the
/// run. When constructed disabled (credentials absent) every send is a
/// logged skip.
pub struct Notifier {
    keys: Option<ApiKeys>,
    endpoint: String,
    client: reqwest::Client,
}

impl Notifier {
    pub fn new(user_key: impl Into<String>, app_token: impl Into<String>) -> Self {
        Self {
            keys: Some(ApiKeys {
                user_key: user_key.into(),
                app_token: app_token.into(),
            }),
            endpoint: PUSHOVER_URL.to_string(),
            client: Self::http_client(),
        }
    }

    /// A notifier with no credentials; every send is skipped.
    pub fn disabled() -> Self {
        warn!("Pushover notifications disabled (credentials not configured)");
        Self {
            keys: None,
            endpoint: PUSHOVER_URL.to_string(),
            client: Self::http_client(),
        }
    }

    /// Point delivery at a custom endpoint. Test seam.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn http_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default()
    }

    /// Send one notification. Returns whether delivery succeeded.
    pub async fn send(&self, title: &str, message: &str, priority: Priority) -> bool {
        let Some(keys) = &self.keys else {
            warn!("Notification skipped (disabled): {title}");
            return false;
        };

        info!("Sending notification: {title}");
        match self.deliver(keys, title, message, priority).await {
            Ok(()) => {
                info!("Notification sent");
                true
            }
            Err(e) => {
                error!("Failed to send notification: {e}");
                false
            }
        }
    }

    async fn deliver(
        &self,
        keys: &ApiKeys,
        title: &str,
        message: &str,
        priority: Priority,
    ) -> Result<(), NotifyError> {
        let form = [
            ("token", keys.app_token.as_str()),
            ("user", keys.user_key.as_str()),
            ("title", title),
            ("message", message),
            ("priority", &priority.level().to_string()),
        ];

        let response = self.client.post(&self.endpoint).form(&form).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Http { status, body });
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;
        if body.status != 1 {
            return Err(NotifyError::Rejected(body.errors.join("; ")));
        }
        Ok(())
    }

    /// Booking went through as planned.
    pub async fn notify_booked(&self, class_name: &str, time_range: &str, reasoning: &str) -> bool {
        let message = format!("Booked: {class_name}\nTime: {time_range}\n\nReason: {reasoning}");
        self.send("Wodify: Class Booked", &message, Priority::Normal)
            .await
    }

    /// The model made a choice a human should look at.
    pub async fn notify_unusual_selection(
        &self,
        class_name: &str,
        time_range: &str,
        reasoning: &str,
    ) -> bool {
        let message = format!(
            "Unusual selection\n\nBooked: {class_name}\nTime: {time_range}\n\nReason: {reasoning}"
        );
        self.send("Wodify: Unusual Booking", &message, Priority::High)
            .await
    }

    /// The run failed; carry the classified cause.
    pub async fn notify_error(&self, error_message: &str) -> bool {
        let message = format!("Booking failed\n\n{error_message}");
        self.send("Wodify: Error", &message, Priority::High).await
    }
}
