//! services/api/src/web/ws_handler.rs
//!
//! The WebSocket entry point: one connection joins one session room and
//! receives that room's mutation events, plus active-session-list changes
//! delivered to every connected client.

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
use futures::{stream, SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};
use vidya_core::domain::Identity;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, identity))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, identity: Identity) {
    info!("New WebSocket connection for user {}", identity.user_id);

    let (mut sender, mut receiver) = socket.split();

    // --- 1. Join Phase ---
    // The first message must be a Join naming an existing session.
    let session_id = match receiver.next().await {
        Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Join { session_id }) => session_id,
            Err(e) => {
                warn!("First message was not a valid Join: {}", e);
                let err_msg = ServerMessage::Error {
                    message: "Expected a join message first.".to_string(),
                };
                let err_json = serde_json::to_string(&err_msg).unwrap();
                let _ = sender.send(Message::Text(err_json.into())).await;
                return;
            }
        },
        _ => {
            info!("Client disconnected before joining a session.");
            return;
        }
    };

    if let Err(e) = app_state.store.get_session(session_id).await {
        warn!("Join rejected for session {}: {:?}", session_id, e);
        let err_msg = ServerMessage::Error {
            message: format!("Unknown session {}", session_id),
        };
        let err_json = serde_json::to_string(&err_msg).unwrap();
        let _ = sender.send(Message::Text(err_json.into())).await;
        return;
    }

    // Subscribe before confirming the join so no event published after the
    // confirmation can be missed.
    let room = app_state.notifier.subscribe(session_id).await;
    let lobby = app_state.notifier.subscribe_session_list().await;
    let mut events = stream::select(room, lobby);

    let joined = ServerMessage::Joined { session_id };
    let joined_json = serde_json::to_string(&joined).unwrap();
    if sender.send(Message::Text(joined_json.into())).await.is_err() {
        return;
    }
    info!("User {} joined session room {}", identity.user_id, session_id);

    // --- 2. Fan-out Loop ---
    loop {
        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(event) => {
                        let msg = ServerMessage::from(event);
                        let json = serde_json::to_string(&msg).unwrap();
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            maybe_msg = receiver.next() => {
                match maybe_msg {
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Client left session room {}", session_id);
                        break;
                    }
                    Some(Ok(Message::Text(_))) => {
                        // Re-joining or chatting over this socket is not part
                        // of the protocol; a client wanting another room opens
                        // a new connection.
                        warn!("Ignoring unexpected client message in room {}", session_id);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    info!("WebSocket connection closed for user {}", identity.user_id);
}
