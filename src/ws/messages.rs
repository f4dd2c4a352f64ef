//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds a server-originated message with a fresh id.
    #[must_use]
    pub fn server(msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), msg_type, payload)
    }

    /// Builds an error reply.
    #[must_use]
    pub fn error(id: String, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }

    /// Serializes the envelope to JSON text.
    #[must_use]
    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client periodic results snapshot.
    Results,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket, carried in the
/// envelope payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events and live results for specific polls.
    Subscribe {
        /// Poll IDs to subscribe to. `"*"` follows every public poll's events.
        poll_ids: Vec<String>,
    },
    /// Unsubscribe from specific polls.
    Unsubscribe {
        /// Poll IDs to unsubscribe from.
        poll_ids: Vec<String>,
    },
    /// Fetch the current results of one poll.
    GetResults {
        /// Target poll ID.
        poll_id: String,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_subscribe_command() {
        let payload = serde_json::json!({ "command": "subscribe", "poll_ids": ["*"] });
        let Ok(cmd) = serde_json::from_value::<WsCommand>(payload) else {
            panic!("expected command");
        };
        assert_eq!(
            cmd,
            WsCommand::Subscribe {
                poll_ids: vec!["*".to_string()]
            }
        );
    }

    #[test]
    fn rejects_unknown_command() {
        let payload = serde_json::json!({ "command": "close_poll", "poll_id": "x" });
        assert!(serde_json::from_value::<WsCommand>(payload).is_err());
    }

    #[test]
    fn envelope_uses_type_key() {
        let msg = WsMessage::error("abc".to_string(), 400, "bad");
        let Some(json) = msg.to_json() else {
            panic!("expected json");
        };
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""id":"abc""#));
    }
}
