//! Wire protocol envelopes
//!
//! The scanner-control protocol is JSON text frames over a duplex WebSocket.
//! Every message carries an `action` tag identifying its purpose; request
//! payloads travel under a `data` object, reply fields sit at the top level
//! next to the tag. Responses are correlated to requests purely by action
//! tag, so the protocol expects one request in flight per action type.

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{ScanOutcome, ScanSettings, ScannerInfo};

/// Action tag strings, as they appear on the wire.
pub mod action {
    pub const LIST_SCANNERS: &str = "list_scanners";
    pub const SCAN: &str = "scan";
    pub const PING: &str = "ping";
    pub const ERROR: &str = "error";
}

/// A request sent by the client to the daemon.
///
/// Serializes as `{"action": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Ask the daemon for the available scanner devices
    ListScanners(ListScannersData),
    /// Trigger a scan acquisition
    Scan(ScanRequestData),
}

impl ClientRequest {
    /// Build a `list_scanners` request for the given client
    pub fn list_scanners(client_id: impl Into<String>) -> Self {
        Self::ListScanners(ListScannersData {
            client_id: client_id.into(),
        })
    }

    /// Build a `scan` request for the given client
    pub fn scan(settings: ScanSettings, client_id: impl Into<String>) -> Self {
        Self::Scan(ScanRequestData {
            settings,
            client_id: client_id.into(),
        })
    }

    /// The action tag this request goes out under
    pub fn action(&self) -> &'static str {
        match self {
            ClientRequest::ListScanners(_) => action::LIST_SCANNERS,
            ClientRequest::Scan(_) => action::SCAN,
        }
    }
}

/// Payload of a `list_scanners` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListScannersData {
    /// Token identifying this client instance to the daemon
    pub client_id: String,
}

/// Payload of a `scan` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequestData {
    /// Scan parameters, flattened into the `data` object
    #[serde(flatten)]
    pub settings: ScanSettings,
    /// Token identifying this client instance to the daemon
    pub client_id: String,
}

/// A message sent by the daemon to the client.
///
/// `ping` frames are unsolicited liveness/status signals; the other variants
/// answer a pending request of the matching action type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to a `list_scanners` request
    ListScanners(ListScannersReply),
    /// Reply to a `scan` request
    Scan(ScanOutcome),
    /// Liveness/status signal, never answers a pending call
    Ping { status: String },
    /// Daemon-side rejection of an unrecognized request
    Error { status: String, message: String },
}

/// Body of a `list_scanners` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListScannersReply {
    /// Reply status ("success" when the daemon could enumerate devices)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Available devices. A missing, null or non-array field deserializes
    /// as an empty list rather than failing the reply.
    #[serde(default, deserialize_with = "lenient_scanner_list")]
    pub scanners: Vec<ScannerInfo>,
}

impl ListScannersReply {
    /// Successful reply listing the given devices
    pub fn new(scanners: Vec<ScannerInfo>) -> Self {
        Self {
            status: Some("success".to_string()),
            scanners,
        }
    }
}

/// Accept anything in the `scanners` slot, coercing non-arrays to empty.
fn lenient_scanner_list<'de, D>(deserializer: D) -> Result<Vec<ScannerInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(_) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}
