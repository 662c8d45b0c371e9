//! services/api/src/web/ws_handler.rs
//!
//! The WebSocket entry point for the realtime support chat. Each connection
//! owns one `ChatMirror` and one realtime subscription: history is sent
//! first, then matching inserts are forwarded as they happen. The
//! subscription is released when the connection ends or the user's session
//! is revoked.

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use meridian_core::chat::ChatMirror;
use meridian_core::ports::RealtimeEvent;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>, // from auth middleware
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, user_id))
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).unwrap();
    sender.send(Message::Text(json.into())).await
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, user_id: Uuid) {
    info!("Support chat connection opened for user {}", user_id);
    let (mut sender, mut receiver) = socket.split();

    // --- 1. History Phase ---
    let history = match app_state.db.messages_for_user(user_id).await {
        Ok(history) => history,
        Err(e) => {
            error!("Failed to load message history: {:?}", e);
            let err_msg = ServerMessage::Error {
                message: "Failed to load message history.".to_string(),
            };
            let _ = send_message(&mut sender, &err_msg).await;
            return;
        }
    };

    // Subscribe before rendering history so no insert is missed in between.
    let mut subscription = app_state.realtime.subscribe();
    let mut mirror = ChatMirror::new();

    for bubble in mirror.enter(user_id, history) {
        if send_message(&mut sender, &ServerMessage::from_bubble(bubble))
            .await
            .is_err()
        {
            error!("Failed to send history bubble.");
            return;
        }
    }

    // --- 2. Main Loop: client messages and realtime events ---
    loop {
        tokio::select! {
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_text(&text, &app_state, user_id).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client sent close message.");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket receive error: {:?}", e);
                        break;
                    }
                    None => {
                        info!("Client disconnected.");
                        break;
                    }
                }
            }
            event = subscription.next_event() => {
                match event {
                    Some(RealtimeEvent::MessageInserted(message)) => {
                        // The mirror decides whether this insert belongs to
                        // the user's conversation.
                        if let Some(bubble) = mirror.on_insert(&message) {
                            if send_message(&mut sender, &ServerMessage::from_bubble(bubble))
                                .await
                                .is_err()
                            {
                                error!("Failed to push live bubble.");
                                break;
                            }
                        }
                    }
                    Some(RealtimeEvent::SessionRevoked { user_id: revoked }) if revoked == user_id => {
                        info!("Session revoked for user {}; closing chat.", user_id);
                        let _ = send_message(&mut sender, &ServerMessage::SignedOut).await;
                        break;
                    }
                    Some(RealtimeEvent::SessionRevoked { .. }) => {}
                    None => {
                        warn!("Realtime hub shut down; closing chat.");
                        break;
                    }
                }
            }
        }
    }

    // --- 3. Cleanup ---
    // Dropping the subscription releases the push channel; the mirror goes
    // back to Idle so no further inserts are mirrored.
    mirror.leave();
    info!("Support chat connection closed for user {}", user_id);
}

/// Handles one inbound text frame: a `send` inserts the message and
/// publishes it, and the sender's own view is updated by the realtime echo.
async fn handle_client_text(text: &str, app_state: &Arc<AppState>, user_id: Uuid) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Send { content }) => {
            let content = content.trim();
            if content.is_empty() {
                return;
            }
            match app_state.db.insert_message(user_id, None, content).await {
                Ok(message) => {
                    app_state
                        .realtime
                        .publish(RealtimeEvent::MessageInserted(message));
                }
                Err(e) => {
                    error!("Failed to insert message: {:?}", e);
                }
            }
        }
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
        }
    }
}
