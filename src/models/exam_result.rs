use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// One finished (or timed-out) exam attempt. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExamResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exam_type: String,
    pub topic_id: Option<i32>,
    pub score: i32,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub time_spent_seconds: i32,
    pub answered_question_ids: JsonValue,
    pub completed_at: DateTime<Utc>,
}
