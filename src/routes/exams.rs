use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;

use crate::dto::exam_dto::{
    AnswerRequest, ExamHistoryResponse, ExamStatusResponse, FlagRequest, FlagResponse,
    StartExamRequest, StartExamResponse, SubmitExamResponse,
};
use crate::error::Result;
use crate::middleware::auth::Claims;
use crate::AppState;

const HISTORY_LIMIT: i64 = 50;

#[axum::debug_handler]
pub async fn start_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartExamRequest>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let started = state
        .exam_service
        .start(user_id, payload.exam_type, payload.topic_id)
        .await?;
    Ok(Json(StartExamResponse::from(started)))
}

#[axum::debug_handler]
pub async fn save_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    state
        .exam_service
        .select_answer(user_id, exam_id, payload.question_index, payload.option_index)
        .await?;
    Ok(Json(json!({
        "saved": true,
        "question_index": payload.question_index
    })))
}

#[axum::debug_handler]
pub async fn toggle_flag(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<Uuid>,
    Json(payload): Json<FlagRequest>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let flagged = state
        .exam_service
        .toggle_flag(user_id, exam_id, payload.question_index)
        .await?;
    Ok(Json(FlagResponse {
        question_index: payload.question_index,
        flagged,
    }))
}

#[axum::debug_handler]
pub async fn get_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let status = state.exam_service.status(user_id, exam_id).await?;
    Ok(Json(ExamStatusResponse::from(status)))
}

#[axum::debug_handler]
pub async fn submit_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let outcome = state.exam_service.submit(user_id, exam_id).await?;
    Ok(Json(SubmitExamResponse::from(outcome)))
}

#[axum::debug_handler]
pub async fn get_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let (results, total) = state.exam_service.history(user_id, HISTORY_LIMIT).await?;
    Ok(Json(ExamHistoryResponse {
        exams: results.into_iter().map(Into::into).collect(),
        total,
    }))
}
