//! The single page the workflow drives.

use std::path::Path;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::debug;

use crate::client::{send_command, PendingMap, WsSink};
use crate::error::BrowserError;
use crate::protocol::CdpMessage;

/// Polling cadence for readiness checks.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Quiet window that counts as "network idle".
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// A CDP session attached to one page target.
///
/// All waits are bounded; an operation either succeeds within its timeout
/// or returns an error. Retry policy lives with the callers.
pub struct Page {
    target_id: String,
    session_id: String,
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    pending: PendingMap,
    request_id: Arc<AtomicU64>,
    events: tokio::sync::Mutex<mpsc::UnboundedReceiver<CdpMessage>>,
    page_load_timeout_ms: u64,
}

impl Page {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
        pending: PendingMap,
        request_id: Arc<AtomicU64>,
        events: mpsc::UnboundedReceiver<CdpMessage>,
        page_load_timeout_ms: u64,
    ) -> Self {
        Self {
            target_id,
            session_id,
            ws_tx,
            pending,
            request_id,
            events: tokio::sync::Mutex::new(events),
            page_load_timeout_ms,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Send a CDP command scoped to this page.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, BrowserError> {
        send_command(
            &self.ws_tx,
            &self.pending,
            &self.request_id,
            method,
            params,
            Some(self.session_id.clone()),
        )
        .await
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), BrowserError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        self.call("Network.enable", None).await?;
        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    pub(crate) async fn set_viewport(&self, width: u32, height: u32) -> Result<(), BrowserError> {
        self.call(
            "Emulation.setDeviceMetricsOverride",
            Some(json!({
                "width": width,
                "height": height,
                "deviceScaleFactor": 1,
                "mobile": false,
            })),
        )
        .await?;
        Ok(())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Navigate and wait for the document to load.
    pub async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        let result = self.call("Page.navigate", Some(json!({"url": url}))).await?;

        if let Some(error) = result.get("errorText") {
            return Err(BrowserError::Navigation(
                error.as_str().unwrap_or("unknown error").to_string(),
            ));
        }

        self.wait_for_load().await?;
        debug!("Navigated to {}", url);
        Ok(())
    }

    /// Reload the current page and wait for it to load.
    pub async fn reload(&self) -> Result<(), BrowserError> {
        self.call("Page.reload", None).await?;
        self.wait_for_load().await
    }

    /// Wait until the document is interactive or complete.
    pub async fn wait_for_load(&self) -> Result<(), BrowserError> {
        let deadline = Instant::now() + Duration::from_millis(self.page_load_timeout_ms);

        loop {
            let state = self.evaluate("document.readyState").await?;
            if let Some(state) = state.as_str() {
                if state == "complete" || state == "interactive" {
                    return Ok(());
                }
            }

            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout("page load timed out".to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait until no network request has been in flight for a quiet window.
    ///
    /// Tracks `Network.*` session events; requests started before this call
    /// that finish during it are ignored by flooring the in-flight count.
    pub async fn wait_for_network_idle(&self, timeout_ms: u64) -> Result<(), BrowserError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut events = self.events.lock().await;
        let mut inflight: u32 = 0;

        // Discard whatever accumulated before this wait started.
        while events.try_recv().is_ok() {}

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(BrowserError::Timeout("network idle timed out".to_string()));
            }
            let window = NETWORK_IDLE_WINDOW.min(deadline - now);

            match tokio::time::timeout(window, events.recv()).await {
                Ok(Some(msg)) => {
                    inflight = apply_network_event(inflight, msg.method.as_deref());
                }
                Ok(None) => return Err(BrowserError::SessionClosed),
                // Quiet window elapsed; idle only if nothing is in flight.
                Err(_) if inflight == 0 => return Ok(()),
                Err(_) => {}
            }
        }
    }

    /// Fixed settle period after a UI-mutating action.
    pub async fn settle(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    // ========================================================================
    // JavaScript
    // ========================================================================

    /// Evaluate an expression and return its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, BrowserError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("unknown error");
            return Err(BrowserError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Click at viewport coordinates with a native press/release pair.
    pub async fn click_at(&self, x: f64, y: f64) -> Result<(), BrowserError> {
        for event_type in ["mousePressed", "mouseReleased"] {
            self.call(
                "Input.dispatchMouseEvent",
                Some(json!({
                    "type": event_type,
                    "x": x,
                    "y": y,
                    "button": "left",
                    "clickCount": 1,
                })),
            )
            .await?;
        }
        debug!("Clicked at ({}, {})", x, y);
        Ok(())
    }

    /// Insert text into the focused element.
    pub async fn insert_text(&self, text: &str) -> Result<(), BrowserError> {
        self.call("Input.insertText", Some(json!({"text": text})))
            .await?;
        debug!("Typed {} characters", text.len());
        Ok(())
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Capture the page as a PNG file.
    pub async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        let result = self
            .call("Page.captureScreenshot", Some(json!({"format": "png"})))
            .await?;

        let data = result["data"]
            .as_str()
            .ok_or_else(|| BrowserError::InvalidResponse("missing screenshot data".to_string()))?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| BrowserError::InvalidResponse(format!("screenshot decode: {e}")))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tokio::fs::write(path, bytes).await?;
        debug!("Screenshot saved: {}", path.display());
        Ok(())
    }
}

/// Fold one session event into the in-flight request count.
fn apply_network_event(inflight: u32, method: Option<&str>) -> u32 {
    match method {
        Some("Network.requestWillBeSent") => inflight + 1,
        Some("Network.loadingFinished") | Some("Network.loadingFailed") => {
            inflight.saturating_sub(1)
        }
        _ => inflight,
    }
}
