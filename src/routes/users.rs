use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::dto::user_dto::LanguageUpdateRequest;
use crate::dto::MessageResponse;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::locale::Locale;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let progress = state.progress_service.get(user_id).await?;
    Ok(Json(progress))
}

#[axum::debug_handler]
pub async fn update_language(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<LanguageUpdateRequest>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let locale = Locale::parse(&payload.language).ok_or_else(|| {
        Error::Validation(format!("language: unsupported locale '{}'", payload.language))
    })?;
    state
        .user_service
        .update_language(user_id, locale.as_str())
        .await?;
    Ok(Json(MessageResponse::new("Language updated successfully")))
}
