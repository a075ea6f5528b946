//! crates/vidya_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or sockets.

use crate::domain::{BoardEvent, Question, QuestionFilter, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every port operation.
/// This abstracts away the specific errors from external services (e.g., database, socket).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Duplicate question: {0}")]
    DuplicateQuestion(String),
    #[error("Session not active: {0}")]
    SessionNotActive(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A stream of board events, as handed to a subscribed client.
pub type EventStream = Pin<Box<dyn Stream<Item = BoardEvent> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The durable store for sessions and questions. The store is the only
/// authoritative state; handlers keep nothing in memory between requests.
#[async_trait]
pub trait BoardStore: Send + Sync {
    // --- Session Management ---
    async fn insert_session(&self, session: Session) -> PortResult<Session>;

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session>;

    /// The instructor's live session, if any.
    async fn find_active_session(&self, instructor_id: Uuid) -> PortResult<Option<Session>>;

    /// Marks a session inactive and stamps `ended_at`. NotFound if the
    /// session does not exist.
    async fn close_session(
        &self,
        session_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> PortResult<Session>;

    /// All active sessions, most recently started first.
    async fn list_active_sessions(&self) -> PortResult<Vec<Session>>;

    /// Every session owned by the instructor, active or not.
    async fn list_sessions_for_instructor(&self, instructor_id: Uuid)
        -> PortResult<Vec<Session>>;

    // --- Question Management ---
    async fn insert_question(&self, question: Question) -> PortResult<Question>;

    async fn get_question(&self, question_id: Uuid) -> PortResult<Question>;

    /// Questions matching the filter, in creation order ascending.
    /// Insertion order is the only ordering guarantee the board makes.
    async fn list_questions(&self, filter: QuestionFilter) -> PortResult<Vec<Question>>;

    /// Overwrites the mutable fields of an existing question.
    async fn save_question(&self, question: Question) -> PortResult<Question>;

    async fn delete_question(&self, question_id: Uuid) -> PortResult<()>;

    /// Deletes every question for the session, returning how many went.
    async fn delete_questions_for_session(&self, session_id: Uuid) -> PortResult<u64>;
}

/// Fan-out of mutation events to connected clients.
///
/// Delivery is best-effort at-most-once: nothing is persisted for
/// subscribers that are offline when an event fires, and a dropped event
/// is only recovered by the client's next poll or full reload. A null
/// implementation (clients poll instead) satisfies this contract too.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Broadcasts an event to all subscribers of `session_id`.
    async fn publish(&self, session_id: Uuid, event: BoardEvent);

    /// Broadcasts `SessionListChanged` to every connected client,
    /// regardless of which session room they joined.
    async fn publish_session_list_changed(&self);

    /// Registers interest in one session's events.
    async fn subscribe(&self, session_id: Uuid) -> EventStream;

    /// Registers interest in active-session-list changes.
    async fn subscribe_session_list(&self) -> EventStream;
}
