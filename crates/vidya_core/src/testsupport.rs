//! crates/vidya_core/src/testsupport.rs
//!
//! In-memory implementations of the ports, used by the lifecycle tests.
//! `TestStore` keeps everything in a `Vec` behind a mutex, which also
//! preserves insertion order — the only ordering the board promises.

use crate::domain::{BoardEvent, Question, QuestionFilter, QuestionStatus, Role, Session};
use crate::ports::{BoardStore, EventStream, Notifier, PortError, PortResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use uuid::Uuid;

pub fn instructor() -> Uuid {
    Uuid::new_v4()
}

pub fn student(name: &str) -> crate::domain::Identity {
    crate::domain::Identity {
        user_id: Uuid::new_v4(),
        name: name.to_string(),
        role: Role::Student,
    }
}

#[derive(Default)]
struct Tables {
    sessions: Vec<Session>,
    questions: Vec<Question>,
}

pub struct TestStore {
    tables: Mutex<Tables>,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Inserts a question directly, bypassing board validation.
    pub async fn seed_question(&self, session_id: Uuid, body: &str) {
        let mut tables = self.tables.lock().unwrap();
        tables.questions.push(Question {
            id: Uuid::new_v4(),
            session_id,
            author_id: Uuid::new_v4(),
            author_name: "seed".to_string(),
            body: body.to_string(),
            status: QuestionStatus::Unanswered,
            is_important: false,
            clarification: None,
            created_at: Utc::now(),
            answered_at: None,
        });
    }
}

#[async_trait]
impl BoardStore for TestStore {
    async fn insert_session(&self, session: Session) -> PortResult<Session> {
        let mut tables = self.tables.lock().unwrap();
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        let tables = self.tables.lock().unwrap();
        tables
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    async fn find_active_session(&self, instructor_id: Uuid) -> PortResult<Option<Session>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.instructor_id == instructor_id && s.active)
            .cloned())
    }

    async fn close_session(
        &self,
        session_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> PortResult<Session> {
        let mut tables = self.tables.lock().unwrap();
        let session = tables
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;
        session.active = false;
        session.ended_at = Some(ended_at);
        Ok(session.clone())
    }

    async fn list_active_sessions(&self) -> PortResult<Vec<Session>> {
        let tables = self.tables.lock().unwrap();
        let mut active: Vec<Session> = tables
            .sessions
            .iter()
            .filter(|s| s.active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        Ok(active)
    }

    async fn list_sessions_for_instructor(
        &self,
        instructor_id: Uuid,
    ) -> PortResult<Vec<Session>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .sessions
            .iter()
            .filter(|s| s.instructor_id == instructor_id)
            .cloned()
            .collect())
    }

    async fn insert_question(&self, question: Question) -> PortResult<Question> {
        let mut tables = self.tables.lock().unwrap();
        tables.questions.push(question.clone());
        Ok(question)
    }

    async fn get_question(&self, question_id: Uuid) -> PortResult<Question> {
        let tables = self.tables.lock().unwrap();
        tables
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Question {} not found", question_id)))
    }

    async fn list_questions(&self, filter: QuestionFilter) -> PortResult<Vec<Question>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .questions
            .iter()
            .filter(|q| filter.session_id.map_or(true, |id| q.session_id == id))
            .filter(|q| filter.status.map_or(true, |status| q.status == status))
            .cloned()
            .collect())
    }

    async fn save_question(&self, question: Question) -> PortResult<Question> {
        let mut tables = self.tables.lock().unwrap();
        let slot = tables
            .questions
            .iter_mut()
            .find(|q| q.id == question.id)
            .ok_or_else(|| PortError::NotFound(format!("Question {} not found", question.id)))?;
        *slot = question.clone();
        Ok(question)
    }

    async fn delete_question(&self, question_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.questions.len();
        tables.questions.retain(|q| q.id != question_id);
        if tables.questions.len() == before {
            return Err(PortError::NotFound(format!(
                "Question {} not found",
                question_id
            )));
        }
        Ok(())
    }

    async fn delete_questions_for_session(&self, session_id: Uuid) -> PortResult<u64> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.questions.len();
        tables.questions.retain(|q| q.session_id != session_id);
        Ok((before - tables.questions.len()) as u64)
    }
}

/// Counts published events instead of delivering them anywhere.
pub struct RecordingNotifier {
    events: Mutex<Vec<(Option<Uuid>, &'static str)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn count(&self, kind: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k)| *k == kind)
            .count()
    }

    pub fn created_count(&self) -> usize {
        self.count("created")
    }

    pub fn session_list_changes(&self) -> usize {
        self.count("session-list-changed")
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, session_id: Uuid, event: BoardEvent) {
        let kind = match event {
            BoardEvent::QuestionCreated(_) => "created",
            BoardEvent::QuestionUpdated(_) => "updated",
            BoardEvent::QuestionDeleted { .. } => "deleted",
            BoardEvent::SessionCleared { .. } => "cleared",
            BoardEvent::SessionListChanged => "session-list-changed",
        };
        self.events.lock().unwrap().push((Some(session_id), kind));
    }

    async fn publish_session_list_changed(&self) {
        self.events
            .lock()
            .unwrap()
            .push((None, "session-list-changed"));
    }

    async fn subscribe(&self, _session_id: Uuid) -> EventStream {
        Box::pin(futures::stream::pending())
    }

    async fn subscribe_session_list(&self) -> EventStream {
        Box::pin(futures::stream::pending())
    }
}
