//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `BoardStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;
use vidya_core::domain::{Question, QuestionFilter, QuestionStatus, Session};
use vidya_core::ports::{BoardStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `BoardStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const SESSION_COLUMNS: &str = "id, instructor_id, label, active, started_at, ended_at";
const QUESTION_COLUMNS: &str = "id, session_id, author_id, author_name, body, status, \
     is_important, clarification, created_at, answered_at";

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    instructor_id: Uuid,
    label: String,
    active: bool,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}
impl SessionRecord {
    fn to_domain(self) -> Session {
        Session {
            id: self.id,
            instructor_id: self.instructor_id,
            label: self.label,
            active: self.active,
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }
}

#[derive(FromRow)]
struct QuestionRecord {
    id: Uuid,
    session_id: Uuid,
    author_id: Uuid,
    author_name: String,
    body: String,
    status: String,
    is_important: bool,
    clarification: Option<String>,
    created_at: DateTime<Utc>,
    answered_at: Option<DateTime<Utc>>,
}
impl QuestionRecord {
    fn to_domain(self) -> PortResult<Question> {
        let status = QuestionStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!(
                "Question {} has unknown status '{}'",
                self.id, self.status
            ))
        })?;
        Ok(Question {
            id: self.id,
            session_id: self.session_id,
            author_id: self.author_id,
            author_name: self.author_name,
            body: self.body,
            status,
            is_important: self.is_important,
            clarification: self.clarification,
            created_at: self.created_at,
            answered_at: self.answered_at,
        })
    }
}

//=========================================================================================
// `BoardStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl BoardStore for PgStore {
    async fn insert_session(&self, session: Session) -> PortResult<Session> {
        let sql = format!(
            "INSERT INTO sessions ({SESSION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SESSION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session.id)
            .bind(session.instructor_id)
            .bind(&session.label)
            .bind(session.active)
            .bind(session.started_at)
            .bind(session.ended_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1");
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Session {} not found", session_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;
        Ok(record.to_domain())
    }

    async fn find_active_session(&self, instructor_id: Uuid) -> PortResult<Option<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE instructor_id = $1 AND active = TRUE"
        );
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(instructor_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(SessionRecord::to_domain))
    }

    async fn close_session(
        &self,
        session_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> PortResult<Session> {
        let sql = format!(
            "UPDATE sessions SET active = FALSE, ended_at = $2 WHERE id = $1 \
             RETURNING {SESSION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session_id)
            .bind(ended_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Session {} not found", session_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;
        Ok(record.to_domain())
    }

    async fn list_active_sessions(&self) -> PortResult<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE active = TRUE \
             ORDER BY started_at DESC"
        );
        let records = sqlx::query_as::<_, SessionRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(SessionRecord::to_domain).collect())
    }

    async fn list_sessions_for_instructor(
        &self,
        instructor_id: Uuid,
    ) -> PortResult<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE instructor_id = $1 \
             ORDER BY started_at DESC"
        );
        let records = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(instructor_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(SessionRecord::to_domain).collect())
    }

    async fn insert_question(&self, question: Question) -> PortResult<Question> {
        let sql = format!(
            "INSERT INTO questions ({QUESTION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {QUESTION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, QuestionRecord>(&sql)
            .bind(question.id)
            .bind(question.session_id)
            .bind(question.author_id)
            .bind(&question.author_name)
            .bind(&question.body)
            .bind(question.status.as_str())
            .bind(question.is_important)
            .bind(&question.clarification)
            .bind(question.created_at)
            .bind(question.answered_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn get_question(&self, question_id: Uuid) -> PortResult<Question> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
        let record = sqlx::query_as::<_, QuestionRecord>(&sql)
            .bind(question_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Question {} not found", question_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;
        record.to_domain()
    }

    async fn list_questions(&self, filter: QuestionFilter) -> PortResult<Vec<Question>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE 1 = 1"));
        if let Some(session_id) = filter.session_id {
            builder.push(" AND session_id = ").push_bind(session_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at ASC");

        let records: Vec<QuestionRecord> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        records.into_iter().map(QuestionRecord::to_domain).collect()
    }

    async fn save_question(&self, question: Question) -> PortResult<Question> {
        let sql = format!(
            "UPDATE questions SET status = $2, is_important = $3, clarification = $4, \
             answered_at = $5 WHERE id = $1 RETURNING {QUESTION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, QuestionRecord>(&sql)
            .bind(question.id)
            .bind(question.status.as_str())
            .bind(question.is_important)
            .bind(&question.clarification)
            .bind(question.answered_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Question {} not found", question.id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;
        record.to_domain()
    }

    async fn delete_question(&self, question_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(question_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Question {} not found",
                question_id
            )));
        }
        Ok(())
    }

    async fn delete_questions_for_session(&self, session_id: Uuid) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM questions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(result.rows_affected())
    }
}
