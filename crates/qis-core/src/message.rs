//! Extension message schema.
//!
//! Content scripts and other extension surfaces send
//! `{"action": "saveImage", "imageUrl": "..."}`. The reply is always
//! `{"success": true}` once the message is accepted; the download itself
//! happens afterwards and its outcome is never reported back.

use serde::{Deserialize, Serialize};

/// Messages the background service understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum InboundMessage {
    #[serde(rename = "saveImage", rename_all = "camelCase")]
    SaveImage { image_url: String },
}

/// Reply to an accepted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
}

impl MessageResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Why a raw message was not handled.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("message is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("unsupported action {0:?}")]
    UnknownAction(String),
    #[error("malformed {action} message: {source}")]
    Malformed {
        action: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parses a raw JSON message, telling unknown actions apart from bad payloads.
pub fn parse_message(raw: &str) -> Result<InboundMessage, MessageError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(MessageError::Json)?;
    let action = value
        .get("action")
        .and_then(|a| a.as_str())
        .unwrap_or_default()
        .to_string();
    if action != "saveImage" {
        return Err(MessageError::UnknownAction(action));
    }
    serde_json::from_value(value).map_err(|source| MessageError::Malformed { action, source })
}
