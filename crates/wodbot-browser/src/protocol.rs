//! CDP wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CDP request message.
#[derive(Debug, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP response or event message.
#[derive(Debug, Deserialize)]
pub struct CdpMessage {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorBody>,
    pub method: Option<String>,
    pub params: Option<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Error body inside a CDP response.
#[derive(Debug, Deserialize)]
pub struct CdpErrorBody {
    pub code: i64,
    pub message: String,
}

/// Entry from the /json/list discovery endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub title: String,
    pub url: String,
    pub web_socket_debugger_url: Option<String>,
}

/// Response from /json/version.
///
/// Chrome returns PascalCase field names for this endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "Protocol-Version")]
    pub protocol_version: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_absent_fields() {
        let req = CdpRequest {
            id: 7,
            method: "Page.enable".to_string(),
            params: None,
            session_id: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"id":7,"method":"Page.enable"}"#);
    }

    #[test]
    fn parses_response_and_event() {
        let resp: CdpMessage =
            serde_json::from_str(r#"{"id":1,"result":{"frameId":"f"}}"#).unwrap();
        assert_eq!(resp.id, Some(1));
        assert!(resp.method.is_none());

        let event: CdpMessage = serde_json::from_str(
            r#"{"method":"Network.requestWillBeSent","params":{},"sessionId":"s1"}"#,
        )
        .unwrap();
        assert!(event.id.is_none());
        assert_eq!(event.method.as_deref(), Some("Network.requestWillBeSent"));
    }

    #[test]
    fn parses_version_endpoint() {
        let version: BrowserVersion = serde_json::from_str(
            r#"{"Browser":"Chrome/120.0.0.0","Protocol-Version":"1.3",
                "webSocketDebuggerUrl":"ws://127.0.0.1:9222/devtools/browser/x"}"#,
        )
        .unwrap();
        assert_eq!(version.protocol_version, "1.3");
        assert!(version.web_socket_debugger_url.starts_with("ws://"));
    }
}
