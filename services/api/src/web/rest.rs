//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::middleware::require_role;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;
use vidya_core::domain::{
    FinishedSession, Identity, Question, QuestionFilter, QuestionPatch, QuestionStatus, Role,
    Session,
};
use vidya_core::ports::PortError;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        start_lecture_handler,
        end_lecture_handler,
        active_lectures_handler,
        my_lectures_handler,
        create_question_handler,
        list_questions_handler,
        update_question_handler,
        add_clarification_handler,
        delete_question_handler,
        clear_questions_handler,
    ),
    components(
        schemas(
            StartLectureRequest,
            EndLectureRequest,
            CreateQuestionRequest,
            UpdateQuestionRequest,
            ClarificationRequest,
            SessionPayload,
            QuestionPayload,
            MyLecturesResponse,
            FinishedSessionPayload,
            ClearResponse,
            ErrorBody,
        )
    ),
    tags(
        (name = "VidyaVichar API", description = "Live classroom Q&A board: lecture sessions, questions, and real-time fan-out.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A lecture session as serialized for clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionPayload {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub label: String,
    pub active: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<Session> for SessionPayload {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            instructor_id: session.instructor_id,
            label: session.label,
            active: session.active,
            started_at: session.started_at,
            ended_at: session.ended_at,
        }
    }
}

/// A question as serialized for clients. `status` is `"unanswered"` or
/// `"answered"`; `is_important` is an independent pin flag.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionPayload {
    pub id: Uuid,
    pub session_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub text: String,
    pub status: String,
    pub is_important: bool,
    pub clarification: Option<String>,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl From<Question> for QuestionPayload {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            session_id: question.session_id,
            author_id: question.author_id,
            author_name: question.author_name,
            text: question.body,
            status: question.status.as_str().to_string(),
            is_important: question.is_important,
            clarification: question.clarification,
            created_at: question.created_at,
            answered_at: question.answered_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FinishedSessionPayload {
    pub session: SessionPayload,
    pub questions: Vec<QuestionPayload>,
}

impl From<FinishedSession> for FinishedSessionPayload {
    fn from(finished: FinishedSession) -> Self {
        Self {
            session: finished.session.into(),
            questions: finished.questions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MyLecturesResponse {
    pub active: Option<SessionPayload>,
    pub finished: Vec<FinishedSessionPayload>,
}

#[derive(Serialize, ToSchema)]
pub struct ClearResponse {
    pub session_id: Uuid,
    pub removed: u64,
}

/// The structured error body every failing endpoint returns.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct StartLectureRequest {
    /// Lecture title shown to students, e.g. "DSA Lecture 12".
    pub label: String,
}

#[derive(Deserialize, ToSchema)]
pub struct EndLectureRequest {
    pub session_id: Uuid,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateQuestionRequest {
    pub session_id: Uuid,
    pub text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateQuestionRequest {
    /// `"unanswered"` or `"answered"`.
    pub status: Option<String>,
    pub is_important: Option<bool>,
    pub clarification: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ClarificationRequest {
    pub text: String,
}

#[derive(Deserialize, IntoParams)]
pub struct ListQuestionsQuery {
    pub session_id: Option<Uuid>,
    /// `"unanswered"` or `"answered"`.
    pub status: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct ClearQuestionsQuery {
    pub session_id: Uuid,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

type ErrorResponse = (StatusCode, Json<ErrorBody>);

/// Maps the port error taxonomy onto HTTP statuses. Only `Unexpected`
/// is logged loudly; the rest are ordinary client outcomes.
fn error_response(err: PortError) -> ErrorResponse {
    let status = match &err {
        PortError::InvalidInput(_) | PortError::SessionNotActive(_) => StatusCode::BAD_REQUEST,
        PortError::DuplicateQuestion(_) => StatusCode::CONFLICT,
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Forbidden(_) => StatusCode::FORBIDDEN,
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {:?}", err);
    }
    (
        status,
        Json(ErrorBody {
            message: err.to_string(),
        }),
    )
}

fn parse_status(raw: Option<&str>) -> Result<Option<QuestionStatus>, ErrorResponse> {
    match raw {
        None => Ok(None),
        Some(s) => QuestionStatus::parse(s).map(Some).ok_or_else(|| {
            error_response(PortError::InvalidInput(format!(
                "unknown status '{}', expected 'unanswered' or 'answered'",
                s
            )))
        }),
    }
}

//=========================================================================================
// Lecture Session Handlers
//=========================================================================================

/// Start a lecture session for the calling instructor.
///
/// If the instructor already has a live session it is closed first and
/// replaced; its questions are kept.
#[utoipa::path(
    post,
    path = "/api/lectures/start",
    request_body = StartLectureRequest,
    responses(
        (status = 201, description = "Session started", body = SessionPayload),
        (status = 400, description = "Blank label", body = ErrorBody),
        (status = 403, description = "Caller is not an instructor", body = ErrorBody),
    )
)]
pub async fn start_lecture_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<StartLectureRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    require_role(&identity, &[Role::Instructor, Role::Admin]).map_err(error_response)?;
    let session = app_state
        .registry
        .start_session(identity.user_id, &req.label)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(SessionPayload::from(session))))
}

/// End the calling instructor's active session.
#[utoipa::path(
    post,
    path = "/api/lectures/end",
    request_body = EndLectureRequest,
    responses(
        (status = 200, description = "Session ended", body = SessionPayload),
        (status = 403, description = "Caller is not an instructor", body = ErrorBody),
        (status = 404, description = "No matching active session", body = ErrorBody),
    )
)]
pub async fn end_lecture_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<EndLectureRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    require_role(&identity, &[Role::Instructor, Role::Admin]).map_err(error_response)?;
    let session = app_state
        .registry
        .end_session(identity.user_id, req.session_id)
        .await
        .map_err(error_response)?;
    Ok(Json(SessionPayload::from(session)))
}

/// List every live session. Unauthenticated: students need this to
/// discover which lectures they can join.
#[utoipa::path(
    get,
    path = "/api/lectures/active",
    responses(
        (status = 200, description = "Active sessions, most recently started first", body = [SessionPayload]),
    )
)]
pub async fn active_lectures_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let sessions = app_state.registry.list_active().await.map_err(error_response)?;
    let payload: Vec<SessionPayload> = sessions.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

/// The calling instructor's live session plus their finished sessions
/// with questions attached.
#[utoipa::path(
    get,
    path = "/api/lectures/mine",
    responses(
        (status = 200, description = "Active and finished sessions", body = MyLecturesResponse),
        (status = 403, description = "Caller is not an instructor", body = ErrorBody),
    )
)]
pub async fn my_lectures_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ErrorResponse> {
    require_role(&identity, &[Role::Instructor, Role::Admin]).map_err(error_response)?;
    let mine = app_state
        .registry
        .sessions_for_instructor(identity.user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(MyLecturesResponse {
        active: mine.active.map(Into::into),
        finished: mine.finished.into_iter().map(Into::into).collect(),
    }))
}

//=========================================================================================
// Question Handlers
//=========================================================================================

/// Post a question to a live session.
#[utoipa::path(
    post,
    path = "/api/questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = QuestionPayload),
        (status = 400, description = "Empty text or inactive session", body = ErrorBody),
        (status = 409, description = "Duplicate question in this session", body = ErrorBody),
    )
)]
pub async fn create_question_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let question = app_state
        .board
        .create_question(req.session_id, &identity, &req.text)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(QuestionPayload::from(question))))
}

/// List questions, optionally filtered by session and status, in
/// creation order.
#[utoipa::path(
    get,
    path = "/api/questions",
    params(ListQuestionsQuery),
    responses(
        (status = 200, description = "Matching questions in creation order", body = [QuestionPayload]),
        (status = 400, description = "Unknown status value", body = ErrorBody),
    )
)]
pub async fn list_questions_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let status = parse_status(query.status.as_deref())?;
    let questions = app_state
        .board
        .list_questions(QuestionFilter {
            session_id: query.session_id,
            status,
        })
        .await
        .map_err(error_response)?;
    let payload: Vec<QuestionPayload> = questions.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

/// Apply a partial update to a question: status flip, importance pin, or
/// clarification text, in any combination.
#[utoipa::path(
    patch,
    path = "/api/questions/{id}",
    request_body = UpdateQuestionRequest,
    params(("id" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "Updated question", body = QuestionPayload),
        (status = 403, description = "Caller may not triage questions", body = ErrorBody),
        (status = 404, description = "Question does not exist", body = ErrorBody),
    )
)]
pub async fn update_question_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    require_role(&identity, &[Role::Instructor, Role::Ta, Role::Admin]).map_err(error_response)?;
    let status = parse_status(req.status.as_deref())?;
    let question = app_state
        .board
        .update_question(
            id,
            QuestionPatch {
                status,
                is_important: req.is_important,
                clarification: req.clarification,
            },
        )
        .await
        .map_err(error_response)?;
    Ok(Json(QuestionPayload::from(question)))
}

/// Attach a clarification note to a question.
#[utoipa::path(
    post,
    path = "/api/questions/{id}/clarification",
    request_body = ClarificationRequest,
    params(("id" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "Updated question", body = QuestionPayload),
        (status = 400, description = "Blank clarification", body = ErrorBody),
        (status = 403, description = "Caller may not triage questions", body = ErrorBody),
        (status = 404, description = "Question does not exist", body = ErrorBody),
    )
)]
pub async fn add_clarification_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<ClarificationRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    require_role(&identity, &[Role::Instructor, Role::Ta, Role::Admin]).map_err(error_response)?;
    let question = app_state
        .board
        .add_clarification(id, &req.text)
        .await
        .map_err(error_response)?;
    Ok(Json(QuestionPayload::from(question)))
}

/// Delete one question. A stale id is reported as 404 rather than
/// silently succeeding, so the caller can re-sync.
#[utoipa::path(
    delete,
    path = "/api/questions/{id}",
    params(("id" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "The deleted question", body = QuestionPayload),
        (status = 403, description = "Caller may not delete questions", body = ErrorBody),
        (status = 404, description = "Question does not exist", body = ErrorBody),
    )
)]
pub async fn delete_question_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    require_role(&identity, &[Role::Instructor, Role::Admin]).map_err(error_response)?;
    let question = app_state
        .board
        .delete_question(id)
        .await
        .map_err(error_response)?;
    Ok(Json(QuestionPayload::from(question)))
}

/// Clear every question in a session. The session record survives.
#[utoipa::path(
    delete,
    path = "/api/questions",
    params(ClearQuestionsQuery),
    responses(
        (status = 200, description = "Questions removed", body = ClearResponse),
        (status = 403, description = "Caller may not clear the board", body = ErrorBody),
    )
)]
pub async fn clear_questions_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ClearQuestionsQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    require_role(&identity, &[Role::Instructor, Role::Admin]).map_err(error_response)?;
    let removed = app_state
        .board
        .clear_session(query.session_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ClearResponse {
        session_id: query.session_id,
        removed,
    }))
}
