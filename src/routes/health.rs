use axum::response::{IntoResponse, Json};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "service": "arborist-exam-backend" }))
}
