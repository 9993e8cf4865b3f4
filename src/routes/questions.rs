use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};

use crate::dto::question_dto::{QuestionListQuery, QuestionsResponse, TopicsResponse};
use crate::error::Result;
use crate::models::topic;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<QuestionListQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let (questions, total) = state
        .question_service
        .list(query.topic_id, query.difficulty, limit)
        .await?;
    Ok(Json(QuestionsResponse { questions, total }))
}

#[axum::debug_handler]
pub async fn list_topics() -> Result<impl IntoResponse> {
    let topics = topic::catalog().iter().map(Into::into).collect();
    Ok(Json(TopicsResponse { topics }))
}
