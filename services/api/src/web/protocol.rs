//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the
//! API server. Event tags match the socket event names the frontends listen
//! for: `new-question`, `update-question`, `delete-question`, `cleared`,
//! `lectures-updated`.

use crate::web::rest::QuestionPayload;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vidya_core::domain::BoardEvent;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Joins the room for one session. This must be the first message sent
    /// on the connection; everything after it flows server -> client.
    Join { session_id: Uuid },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
///
/// Delivery is best-effort at-most-once: a client that was offline when an
/// event fired re-fetches the full list on reconnect.
#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Confirms the room join.
    Joined { session_id: Uuid },

    /// Reports a fatal error; the server closes the connection after this.
    Error { message: String },

    /// A question was posted to the joined session.
    NewQuestion { question: QuestionPayload },

    /// A question in the joined session changed (status, pin, clarification).
    UpdateQuestion { question: QuestionPayload },

    /// A question was removed from the joined session.
    DeleteQuestion { id: Uuid, session_id: Uuid },

    /// The joined session's board was wiped.
    Cleared { session_id: Uuid },

    /// The set of active sessions changed. Sent to every connected client,
    /// not just the joined room; clients re-fetch `/api/lectures/active`.
    LecturesUpdated,
}

impl From<BoardEvent> for ServerMessage {
    fn from(event: BoardEvent) -> Self {
        match event {
            BoardEvent::QuestionCreated(question) => ServerMessage::NewQuestion {
                question: question.into(),
            },
            BoardEvent::QuestionUpdated(question) => ServerMessage::UpdateQuestion {
                question: question.into(),
            },
            BoardEvent::QuestionDeleted {
                question_id,
                session_id,
            } => ServerMessage::DeleteQuestion {
                id: question_id,
                session_id,
            },
            BoardEvent::SessionCleared { session_id } => ServerMessage::Cleared { session_id },
            BoardEvent::SessionListChanged => ServerMessage::LecturesUpdated,
        }
    }
}
