use crate::models::locale::LocalizedText;
use crate::models::question::{Difficulty, Question, QuestionKind};
use crate::services::import_service::ImportRow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionPayload {
    pub topic_id: i32,
    pub prompt: LocalizedText,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub explanation: LocalizedText,
    pub difficulty: Option<Difficulty>,
}

impl QuestionPayload {
    pub fn into_question(self, id: Uuid, created_at: chrono::DateTime<chrono::Utc>) -> Question {
        Question {
            id,
            topic_id: self.topic_id,
            prompt: self.prompt,
            kind: self.kind,
            explanation: self.explanation,
            difficulty: self.difficulty.unwrap_or(Difficulty::Medium),
            created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserPayload {
    #[validate(length(min = 3, max = 64, message = "username must be 3-64 characters"))]
    pub username: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub language: Option<String>,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkImportRequest {
    pub questions: Vec<ImportRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateResponse {
    pub csv_content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminStatsResponse {
    pub total_users: i64,
    pub total_questions: i64,
    pub questions_by_topic: HashMap<i32, i64>,
}
