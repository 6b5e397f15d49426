//! Wire messages between the hub and viewers.
//!
//! Outbound messages are built here so every path serializes the same
//! shapes; inbound viewer text is parsed into [`ViewerCommand`] before it
//! reaches the hub loop.

use serde_json::{json, Value};

use crate::record::local_timestamp;
use crate::snapshot::DirEntryInfo;

/// Greeting sent to every viewer immediately after the handshake.
pub const GREETING: &str = "Welcome to the Research Station OS";

/// The `connected` welcome message.
pub fn connected() -> Value {
    json!({
        "type": "connected",
        "message": GREETING,
        "timestamp": local_timestamp(),
    })
}

/// The one-shot `filesystem_state` snapshot for a new viewer.
pub fn filesystem_state(entries: &[DirEntryInfo]) -> Value {
    json!({
        "type": "filesystem_state",
        "desktop": entries,
        "timestamp": local_timestamp(),
    })
}

/// Reply to a viewer `ping`.
pub fn pong() -> Value {
    json!({
        "type": "pong",
        "timestamp": local_timestamp(),
    })
}

/// Parsed inbound viewer message.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    /// Liveness probe; answered with [`pong`].
    Ping,
    /// The viewer opened a file in its UI. Acknowledged in logs only.
    FileOpened { filename: Option<String> },
    /// Anything else. Logged and otherwise ignored.
    Unknown(String),
}

impl ViewerCommand {
    /// Classify a decoded inbound JSON object by its `type` tag.
    pub fn parse(value: &Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("ping") => Self::Ping,
            Some("file_opened") => Self::FileOpened {
                filename: value
                    .get("filename")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            Some(other) => Self::Unknown(other.to_string()),
            None => Self::Unknown("<untyped>".to_string()),
        }
    }
}
