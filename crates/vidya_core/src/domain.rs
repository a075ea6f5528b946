//! crates/vidya_core/src/domain.rs
//!
//! Defines the pure, core data structures for the question board.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A live lecture session opened by an instructor.
///
/// At most one session per instructor has `active = true` at any time;
/// starting a new one force-closes the previous. Sessions are retained
/// after they end so finished lectures can be reviewed.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub instructor_id: Uuid,
    /// Instructor-chosen lecture title, e.g. "DSA Lecture 12".
    pub label: String,
    pub active: bool,
    pub started_at: DateTime<Utc>,
    /// `None` while the session is live.
    pub ended_at: Option<DateTime<Utc>>,
}

/// A student question posted against a session.
#[derive(Debug, Clone)]
pub struct Question {
    pub id: Uuid,
    pub session_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    /// Trimmed, non-empty body text.
    pub body: String,
    pub status: QuestionStatus,
    /// Pin flag, orthogonal to `status`. An answered question can still
    /// be pinned as important.
    pub is_important: bool,
    /// Optional short note from the instructor, e.g. "see slide 14".
    pub clarification: Option<String>,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

/// The two-valued question status. Importance is a separate flag, not a
/// third status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Unanswered,
    Answered,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::Unanswered => "unanswered",
            QuestionStatus::Answered => "answered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unanswered" => Some(QuestionStatus::Unanswered),
            "answered" => Some(QuestionStatus::Answered),
            _ => None,
        }
    }
}

/// Role claims supplied by the upstream auth collaborator. The core only
/// consumes these; it never manages credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Instructor,
    Ta,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Ta => "ta",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Role::Student),
            // A couple of the frontends say "teacher", accept both.
            "instructor" | "teacher" => Some(Role::Instructor),
            "ta" => Some(Role::Ta),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// An already-authenticated caller identity.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
}

/// A partial update applied to a question. `None` fields are left
/// untouched; status and importance are independently settable.
#[derive(Debug, Clone, Default)]
pub struct QuestionPatch {
    pub status: Option<QuestionStatus>,
    pub is_important: Option<bool>,
    pub clarification: Option<String>,
}

/// Filter for question listings. Empty filter returns everything in
/// creation order.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionFilter {
    pub session_id: Option<Uuid>,
    pub status: Option<QuestionStatus>,
}

/// An instructor's sessions, split into the (at most one) live session
/// and the finished ones with their questions joined in at read time.
#[derive(Debug, Clone)]
pub struct InstructorSessions {
    pub active: Option<Session>,
    pub finished: Vec<FinishedSession>,
}

/// A finished session together with the questions asked during it.
#[derive(Debug, Clone)]
pub struct FinishedSession {
    pub session: Session,
    pub questions: Vec<Question>,
}

/// A mutation event fanned out to clients watching a session. Delivery
/// is best-effort at-most-once; a client that misses one re-fetches the
/// full list.
#[derive(Debug, Clone)]
pub enum BoardEvent {
    QuestionCreated(Question),
    QuestionUpdated(Question),
    QuestionDeleted { question_id: Uuid, session_id: Uuid },
    SessionCleared { session_id: Uuid },
    SessionListChanged,
}
