//! crates/vidya_core/src/registry.rs
//!
//! The session registry: tracks which lecture is currently open per
//! instructor and enforces "at most one active session per instructor".

use crate::domain::{FinishedSession, InstructorSessions, QuestionFilter, Session};
use crate::ports::{BoardStore, Notifier, PortError, PortResult};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Start/end/list operations over lecture sessions. Holds no state of
/// its own; everything durable lives in the store.
#[derive(Clone)]
pub struct SessionRegistry {
    store: Arc<dyn BoardStore>,
    notifier: Arc<dyn Notifier>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn BoardStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Starts a new session for the instructor.
    ///
    /// If one is already active this is NOT an error: the old session is
    /// closed first (its `ended_at` gets stamped, its questions are kept)
    /// and the new one replaces it as the live session.
    pub async fn start_session(&self, instructor_id: Uuid, label: &str) -> PortResult<Session> {
        let label = label.trim();
        if label.is_empty() {
            return Err(PortError::InvalidInput(
                "session label must not be empty".to_string(),
            ));
        }

        if let Some(previous) = self.store.find_active_session(instructor_id).await? {
            self.store.close_session(previous.id, Utc::now()).await?;
        }

        let session = self
            .store
            .insert_session(Session {
                id: Uuid::new_v4(),
                instructor_id,
                label: label.to_string(),
                active: true,
                started_at: Utc::now(),
                ended_at: None,
            })
            .await?;

        self.notifier.publish_session_list_changed().await;
        Ok(session)
    }

    /// Ends the instructor's session. NotFound unless `session_id` names
    /// a session that belongs to this instructor and is still active.
    pub async fn end_session(&self, instructor_id: Uuid, session_id: Uuid) -> PortResult<Session> {
        let session = self.store.get_session(session_id).await?;
        if session.instructor_id != instructor_id || !session.active {
            return Err(PortError::NotFound(format!(
                "no active session {} for this instructor",
                session_id
            )));
        }

        let closed = self.store.close_session(session_id, Utc::now()).await?;
        self.notifier.publish_session_list_changed().await;
        Ok(closed)
    }

    /// All currently joinable sessions, most recently started first.
    /// Intentionally unauthenticated-friendly: students use this to
    /// discover which lectures they can join.
    pub async fn list_active(&self) -> PortResult<Vec<Session>> {
        self.store.list_active_sessions().await
    }

    /// The instructor's live session (if any) plus their finished
    /// sessions with questions joined in at read time.
    pub async fn sessions_for_instructor(
        &self,
        instructor_id: Uuid,
    ) -> PortResult<InstructorSessions> {
        let sessions = self.store.list_sessions_for_instructor(instructor_id).await?;

        let mut active = None;
        let mut closed = Vec::new();
        for session in sessions {
            if session.active {
                active = Some(session);
            } else {
                closed.push(session);
            }
        }
        // Most recently ended first, like the lecture-history views expect.
        closed.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));

        let mut finished = Vec::with_capacity(closed.len());
        for session in closed {
            let questions = self
                .store
                .list_questions(QuestionFilter {
                    session_id: Some(session.id),
                    status: None,
                })
                .await?;
            finished.push(FinishedSession { session, questions });
        }

        Ok(InstructorSessions { active, finished })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::{instructor, RecordingNotifier, TestStore};

    fn registry(store: &Arc<TestStore>, notifier: &Arc<RecordingNotifier>) -> SessionRegistry {
        SessionRegistry::new(store.clone(), notifier.clone())
    }

    #[tokio::test]
    async fn start_session_creates_an_active_session() {
        let store = Arc::new(TestStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let registry = registry(&store, &notifier);
        let instr = instructor();

        let session = registry.start_session(instr, "OS Lecture 1").await.unwrap();

        assert!(session.active);
        assert_eq!(session.label, "OS Lecture 1");
        assert!(session.ended_at.is_none());
        assert_eq!(notifier.session_list_changes(), 1);
    }

    #[tokio::test]
    async fn start_session_rejects_blank_label() {
        let store = Arc::new(TestStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let registry = registry(&store, &notifier);

        let err = registry.start_session(instructor(), "   ").await.unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn starting_a_second_session_replaces_the_first() {
        let store = Arc::new(TestStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let registry = registry(&store, &notifier);
        let instr = instructor();

        let first = registry.start_session(instr, "Lecture A").await.unwrap();
        let second = registry.start_session(instr, "Lecture B").await.unwrap();

        let active = registry.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);

        // The replaced session was closed, not deleted.
        let closed = store.get_session(first.id).await.unwrap();
        assert!(!closed.active);
        assert!(closed.ended_at.is_some());
    }

    #[tokio::test]
    async fn end_session_requires_a_matching_active_session() {
        let store = Arc::new(TestStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let registry = registry(&store, &notifier);
        let instr = instructor();

        let session = registry.start_session(instr, "Lecture").await.unwrap();

        // Someone else's instructor id does not match.
        let err = registry
            .end_session(instructor(), session.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let ended = registry.end_session(instr, session.id).await.unwrap();
        assert!(!ended.active);
        assert!(ended.ended_at.is_some());

        // Ending twice fails: the session is no longer active.
        let err = registry.end_session(instr, session.id).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_active_orders_most_recent_first() {
        let store = Arc::new(TestStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let registry = registry(&store, &notifier);

        let older = registry.start_session(instructor(), "First").await.unwrap();
        let newer = registry.start_session(instructor(), "Second").await.unwrap();

        let active = registry.list_active().await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].id, newer.id);
        assert_eq!(active[1].id, older.id);
    }

    #[tokio::test]
    async fn sessions_for_instructor_joins_questions_onto_finished_sessions() {
        let store = Arc::new(TestStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let registry = registry(&store, &notifier);
        let instr = instructor();

        let session = registry.start_session(instr, "Lecture 1").await.unwrap();
        store.seed_question(session.id, "What is Big-O?").await;
        registry.end_session(instr, session.id).await.unwrap();

        let live = registry.start_session(instr, "Lecture 2").await.unwrap();

        let mine = registry.sessions_for_instructor(instr).await.unwrap();
        assert_eq!(mine.active.as_ref().map(|s| s.id), Some(live.id));
        assert_eq!(mine.finished.len(), 1);
        assert_eq!(mine.finished[0].session.id, session.id);
        assert_eq!(mine.finished[0].questions.len(), 1);
        assert_eq!(mine.finished[0].questions[0].body, "What is Big-O?");
    }
}
