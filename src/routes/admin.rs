use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::dto::admin_dto::{
    AdminStatsResponse, BulkImportRequest, CreateUserPayload, QuestionPayload, TemplateResponse,
};
use crate::dto::auth_dto::UserView;
use crate::dto::question_dto::QuestionsResponse;
use crate::dto::MessageResponse;
use crate::error::{Error, Result};
use crate::models::locale::Locale;
use crate::models::user::{ROLE_ADMIN, ROLE_STUDENT};
use crate::services::export_service::ExportService;
use crate::services::import_service;
use crate::services::user_service::NewUser;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let users = state.user_service.list().await?;
    let views: Vec<UserView> = users.into_iter().map(Into::into).collect();
    Ok(Json(views))
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let role = match payload.role.as_deref() {
        None => ROLE_STUDENT,
        Some(role) if role == ROLE_STUDENT || role == ROLE_ADMIN => role,
        Some(other) => {
            return Err(Error::Validation(format!("role: unknown role '{}'", other)))
        }
    };
    let language = match payload.language.as_deref() {
        None => Locale::default().as_str().to_string(),
        Some(lang) => Locale::parse(lang)
            .ok_or_else(|| Error::Validation(format!("language: unsupported locale '{}'", lang)))?
            .as_str()
            .to_string(),
    };

    let user = state
        .user_service
        .create(
            NewUser {
                username: payload.username,
                email: payload.email,
                name: payload.name,
                language,
                password: payload.password,
            },
            role,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(UserView::from(user))))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.user_service.delete(user_id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[derive(Debug, Deserialize)]
pub struct AdminQuestionQuery {
    pub topic_id: Option<i32>,
    pub limit: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<AdminQuestionQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.limit.unwrap_or(1000).clamp(1, 1000);
    let (questions, total) = state
        .question_service
        .list(query.topic_id, None, limit)
        .await?;
    Ok(Json(QuestionsResponse { questions, total }))
}

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse> {
    let question = payload.into_question(Uuid::new_v4(), crate::utils::time::now());
    let question = state.question_service.create(question).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse> {
    let existing = state.question_service.get(question_id).await?;
    let question = payload.into_question(question_id, existing.created_at);
    let question = state.question_service.update(question).await?;
    Ok(Json(question))
}

#[axum::debug_handler]
pub async fn delete_question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.question_service.delete(question_id).await?;
    Ok(Json(MessageResponse::new("Question deleted successfully")))
}

#[axum::debug_handler]
pub async fn bulk_import_questions(
    State(state): State<AppState>,
    Json(payload): Json<BulkImportRequest>,
) -> Result<impl IntoResponse> {
    if payload.questions.is_empty() {
        return Err(Error::Validation(
            "questions: at least one row is required".to_string(),
        ));
    }
    let report = state.import_service.bulk_import(payload.questions).await?;
    Ok(Json(report))
}

#[axum::debug_handler]
pub async fn download_template() -> Result<impl IntoResponse> {
    Ok(Json(TemplateResponse {
        csv_content: import_service::csv_template(),
    }))
}

#[axum::debug_handler]
pub async fn export_questions(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let questions = state.question_service.bank_for_exam(None).await?;
    let bytes = ExportService::generate_question_bank_xlsx(&questions)?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"question_bank.xlsx\"",
            ),
        ],
        bytes,
    ))
}

#[axum::debug_handler]
pub async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let total_users = state.user_service.count().await?;
    let total_questions = state.question_service.count().await?;
    let questions_by_topic = state.question_service.count_by_topic().await?;
    Ok(Json(AdminStatsResponse {
        total_users,
        total_questions,
        questions_by_topic,
    }))
}
