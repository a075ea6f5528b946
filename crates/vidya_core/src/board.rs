//! crates/vidya_core/src/board.rs
//!
//! The question lifecycle handler: validates and persists question
//! creation, applies instructor/TA status transitions, and triggers
//! fan-out scoped to the owning session on every mutation.

use crate::domain::{
    BoardEvent, Identity, Question, QuestionFilter, QuestionPatch, QuestionStatus,
};
use crate::ports::{BoardStore, Notifier, PortError, PortResult};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// CRUD over questions, bound to one store and one notifier.
#[derive(Clone)]
pub struct QuestionBoard {
    store: Arc<dyn BoardStore>,
    notifier: Arc<dyn Notifier>,
}

impl QuestionBoard {
    pub fn new(store: Arc<dyn BoardStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Creates a question against an active session.
    ///
    /// Rejects empty text (`InvalidInput`), a missing or ended session
    /// (`SessionNotActive`), and a case-insensitive repeat of a body
    /// already on the board for this session (`DuplicateQuestion`).
    pub async fn create_question(
        &self,
        session_id: Uuid,
        author: &Identity,
        text: &str,
    ) -> PortResult<Question> {
        let body = text.trim();
        if body.is_empty() {
            return Err(PortError::InvalidInput(
                "question text must not be empty".to_string(),
            ));
        }

        let session = match self.store.get_session(session_id).await {
            Ok(session) => session,
            Err(PortError::NotFound(_)) => {
                return Err(PortError::SessionNotActive(format!(
                    "session {} does not exist",
                    session_id
                )))
            }
            Err(e) => return Err(e),
        };
        if !session.active {
            return Err(PortError::SessionNotActive(format!(
                "session {} has ended",
                session_id
            )));
        }

        // Known race: two near-simultaneous identical submissions can both
        // pass this check before either insert lands. Accepted, see DESIGN.md.
        let lowered = body.to_lowercase();
        let existing = self
            .store
            .list_questions(QuestionFilter {
                session_id: Some(session_id),
                status: None,
            })
            .await?;
        if existing.iter().any(|q| q.body.to_lowercase() == lowered) {
            return Err(PortError::DuplicateQuestion(
                "this question has already been asked in this session".to_string(),
            ));
        }

        let question = self
            .store
            .insert_question(Question {
                id: Uuid::new_v4(),
                session_id,
                author_id: author.user_id,
                author_name: author.name.clone(),
                body: body.to_string(),
                status: QuestionStatus::Unanswered,
                is_important: false,
                clarification: None,
                created_at: Utc::now(),
                answered_at: None,
            })
            .await?;

        self.notifier
            .publish(session_id, BoardEvent::QuestionCreated(question.clone()))
            .await;
        Ok(question)
    }

    /// Questions matching the filter, in creation order ascending.
    pub async fn list_questions(&self, filter: QuestionFilter) -> PortResult<Vec<Question>> {
        self.store.list_questions(filter).await
    }

    /// Applies a partial update. Status and importance are independent:
    /// pinning an answered question is legal and must stay legal.
    /// Moving to `Answered` stamps `answered_at`; moving back clears it.
    pub async fn update_question(
        &self,
        question_id: Uuid,
        patch: QuestionPatch,
    ) -> PortResult<Question> {
        let mut question = self.store.get_question(question_id).await?;

        if let Some(status) = patch.status {
            if status != question.status {
                question.answered_at = match status {
                    QuestionStatus::Answered => Some(Utc::now()),
                    QuestionStatus::Unanswered => None,
                };
            }
            question.status = status;
        }
        if let Some(is_important) = patch.is_important {
            question.is_important = is_important;
        }
        if let Some(clarification) = patch.clarification {
            question.clarification = Some(clarification);
        }

        let question = self.store.save_question(question).await?;
        self.notifier
            .publish(
                question.session_id,
                BoardEvent::QuestionUpdated(question.clone()),
            )
            .await;
        Ok(question)
    }

    /// Sets the instructor's clarification text on a question.
    pub async fn add_clarification(&self, question_id: Uuid, text: &str) -> PortResult<Question> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PortError::InvalidInput(
                "clarification text must not be empty".to_string(),
            ));
        }
        self.update_question(
            question_id,
            QuestionPatch {
                clarification: Some(text.to_string()),
                ..QuestionPatch::default()
            },
        )
        .await
    }

    /// Deletes one question. The source variants disagree on whether a
    /// missing id is an error; this board reports NotFound so the caller
    /// can tell a stale id from a successful delete.
    pub async fn delete_question(&self, question_id: Uuid) -> PortResult<Question> {
        let question = self.store.get_question(question_id).await?;
        self.store.delete_question(question_id).await?;
        self.notifier
            .publish(
                question.session_id,
                BoardEvent::QuestionDeleted {
                    question_id,
                    session_id: question.session_id,
                },
            )
            .await;
        Ok(question)
    }

    /// Deletes every question in the session (the session record itself
    /// is untouched) and returns how many were removed.
    pub async fn clear_session(&self, session_id: Uuid) -> PortResult<u64> {
        let count = self.store.delete_questions_for_session(session_id).await?;
        self.notifier
            .publish(session_id, BoardEvent::SessionCleared { session_id })
            .await;
        Ok(count)
    }
}
