pub mod admin_dto;
pub mod auth_dto;
pub mod exam_dto;
pub mod question_dto;
pub mod subscription_dto;
pub mod user_dto;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
