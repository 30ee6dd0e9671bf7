//! Browser connection: Chrome lifecycle plus the CDP WebSocket channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use crate::error::BrowserError;
use crate::launcher::{self, WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::protocol::{BrowserVersion, CdpMessage, CdpRequest, PageInfo};
use crate::session::Page;
use crate::BrowserConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// How long a single CDP command may take before it is abandoned.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// A request awaiting its response.
pub(crate) struct PendingRequest {
    pub tx: oneshot::Sender<Result<Value, BrowserError>>,
}

pub(crate) type PendingMap = Arc<Mutex<HashMap<u64, PendingRequest>>>;
pub(crate) type EventSlot = Arc<Mutex<Option<mpsc::UnboundedSender<CdpMessage>>>>;

/// One Chrome instance driven over CDP. The browser owns the process it
/// spawned and the WebSocket; `close` must run on every exit path.
pub struct Browser {
    http_endpoint: String,
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    request_id: Arc<AtomicU64>,
    pending: PendingMap,
    events: EventSlot,
    chrome: tokio::sync::Mutex<Option<tokio::process::Child>>,
    recv_task: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch Chrome and connect the protocol channel.
    pub async fn launch(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let http_endpoint = format!("http://127.0.0.1:{}", config.debug_port);

        let chrome = launcher::launch_chrome(config).await?;

        // Chrome takes a moment to open the debug endpoint.
        let mut ready = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(200)).await;
            if reqwest::get(format!("{http_endpoint}/json/version")).await.is_ok() {
                ready = true;
                break;
            }
        }
        if !ready {
            let mut child = chrome;
            let _ = child.kill().await;
            return Err(BrowserError::LaunchFailed(
                "Chrome did not open its debug endpoint in time".to_string(),
            ));
        }

        let version: BrowserVersion = reqwest::get(format!("{http_endpoint}/json/version"))
            .await?
            .json()
            .await?;
        debug!("Connected to browser: {}", version.browser);

        let (ws_stream, _) = tokio_tungstenite::connect_async(&version.web_socket_debugger_url)
            .await
            .map_err(|e| BrowserError::ConnectionFailed(format!("WebSocket: {e}")))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let events: EventSlot = Arc::new(Mutex::new(None));

        let recv_task = {
            let pending = pending.clone();
            let events = events.clone();
            tokio::spawn(async move {
                receive_loop(ws_source, pending, events).await;
            })
        };

        info!("CDP channel open at {}", version.web_socket_debugger_url);

        Ok(Self {
            http_endpoint,
            ws_tx: Arc::new(tokio::sync::Mutex::new(ws_sink)),
            request_id: Arc::new(AtomicU64::new(1)),
            pending,
            events,
            chrome: tokio::sync::Mutex::new(Some(chrome)),
            recv_task,
        })
    }

    /// Attach to the browser's page target, creating one if Chrome opened
    /// without any. The workflow drives exactly one page per run.
    pub async fn open_page(&self, config: &BrowserConfig) -> Result<Page, BrowserError> {
        let pages: Vec<PageInfo> =
            reqwest::get(format!("{}/json/list", self.http_endpoint))
                .await?
                .json()
                .await?;

        let target_id = match pages.into_iter().find(|p| p.page_type == "page") {
            Some(p) => p.id,
            None => {
                // Chrome requires PUT for /json/new.
                let client = reqwest::Client::new();
                let page: PageInfo = client
                    .put(format!("{}/json/new", self.http_endpoint))
                    .send()
                    .await?
                    .json()
                    .await?;
                page.id
            }
        };

        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({"targetId": target_id, "flatten": true})),
                None,
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| BrowserError::InvalidResponse("missing sessionId".to_string()))?
            .to_string();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        *self.events.lock() = Some(event_tx);

        let page = Page::new(
            target_id,
            session_id,
            self.ws_tx.clone(),
            self.pending.clone(),
            self.request_id.clone(),
            event_rx,
            config.page_load_timeout_ms,
        );

        page.enable_domains().await?;
        page.set_viewport(WINDOW_WIDTH, WINDOW_HEIGHT).await?;

        Ok(page)
    }

    /// Send a browser-level CDP command.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, BrowserError> {
        send_command(
            &self.ws_tx,
            &self.pending,
            &self.request_id,
            method,
            params,
            session_id.map(|s| s.to_string()),
        )
        .await
    }

    /// Shut everything down. Idempotent; safe after a partial launch.
    pub async fn close(&self) {
        if let Some(mut child) = self.chrome.lock().await.take() {
            info!("Shutting down Chrome...");
            // Ask nicely first so profile state is flushed.
            let _ = tokio::time::timeout(
                Duration::from_secs(2),
                self.call("Browser.close", None, None),
            )
            .await;
            let _ = child.kill().await;
        }
        self.recv_task.abort();
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        self.recv_task.abort();
        if let Ok(mut guard) = self.chrome.try_lock() {
            if let Some(child) = guard.as_mut() {
                let _ = child.start_kill();
            }
        }
    }
}

/// Route incoming frames: responses to their pending caller, events to the
/// attached page.
async fn receive_loop(mut ws_source: WsSource, pending: PendingMap, events: EventSlot) {
    while let Some(msg) = ws_source.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                trace!("CDP recv: {}", text);
                match serde_json::from_str::<CdpMessage>(&text) {
                    Ok(msg) => {
                        if let Some(id) = msg.id {
                            let pending_req = pending.lock().remove(&id);
                            if let Some(req) = pending_req {
                                let result = if let Some(err) = msg.error {
                                    Err(BrowserError::Protocol {
                                        code: err.code,
                                        message: err.message,
                                    })
                                } else {
                                    Ok(msg.result.unwrap_or(Value::Null))
                                };
                                let _ = req.tx.send(result);
                            }
                        } else if msg.method.is_some() {
                            let tx = events.lock().clone();
                            if let Some(tx) = tx {
                                let _ = tx.send(msg);
                            }
                        }
                    }
                    Err(e) => warn!("Failed to parse CDP message: {}", e),
                }
            }
            Ok(Message::Close(_)) => {
                debug!("WebSocket closed");
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }
}

/// Send one command and wait for its reply.
pub(crate) async fn send_command(
    ws_tx: &Arc<tokio::sync::Mutex<WsSink>>,
    pending: &PendingMap,
    request_id: &Arc<AtomicU64>,
    method: &str,
    params: Option<Value>,
    session_id: Option<String>,
) -> Result<Value, BrowserError> {
    let id = request_id.fetch_add(1, Ordering::SeqCst);

    let request = CdpRequest {
        id,
        method: method.to_string(),
        params,
        session_id,
    };

    let json = serde_json::to_string(&request)?;
    trace!("CDP send: {}", json);

    let (tx, rx) = oneshot::channel();
    pending.lock().insert(id, PendingRequest { tx });

    {
        let mut ws = ws_tx.lock().await;
        ws.send(Message::Text(json.into())).await?;
    }

    match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(BrowserError::SessionClosed),
        Err(_) => {
            pending.lock().remove(&id);
            Err(BrowserError::Timeout(format!("request {method} timed out")))
        }
    }
}
