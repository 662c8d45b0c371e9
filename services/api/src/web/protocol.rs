//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for the realtime support chat.

use chrono::{DateTime, Utc};
use meridian_core::chat::{Bubble, BubbleKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submits a new chat message addressed to the support desk.
    Send { content: String },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One rendered chat entry. History bubbles arrive first, in ascending
    /// creation order; live bubbles follow as they are inserted.
    Bubble {
        message_id: Uuid,
        content: String,
        /// `sent` when the current user authored the message, `received` otherwise.
        kind: String,
        created_at: DateTime<Utc>,
    },

    /// The user's session was revoked elsewhere (logout); the connection is
    /// about to close.
    SignedOut,

    /// Reports a fatal error to the client, which should display an error message.
    Error { message: String },
}

impl ServerMessage {
    pub fn from_bubble(bubble: &Bubble) -> Self {
        let kind = match bubble.kind {
            BubbleKind::Sent => "sent",
            BubbleKind::Received => "received",
        };
        ServerMessage::Bubble {
            message_id: bubble.message_id,
            content: bubble.content.clone(),
            kind: kind.to_string(),
            created_at: bubble.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn client_send_parses() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"send","content":"hello"}"#).unwrap();
        let ClientMessage::Send { content } = msg;
        assert_eq!(content, "hello");
    }

    #[test]
    fn bubble_kind_serializes_by_sender_identity() {
        let bubble = Bubble {
            message_id: Uuid::new_v4(),
            content: "hi".to_string(),
            kind: BubbleKind::Sent,
            created_at: Utc.timestamp_opt(10, 0).unwrap(),
        };

        let json = serde_json::to_string(&ServerMessage::from_bubble(&bubble)).unwrap();
        assert!(json.contains(r#""type":"bubble""#));
        assert!(json.contains(r#""kind":"sent""#));
    }
}
