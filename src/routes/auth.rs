use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::dto::auth_dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::{Error, Result};
use crate::middleware::auth::issue_token;
use crate::models::locale::Locale;
use crate::services::user_service::NewUser;
use crate::AppState;

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let language = match payload.language.as_deref() {
        None => Locale::default().as_str().to_string(),
        Some(lang) => Locale::parse(lang)
            .ok_or_else(|| Error::Validation(format!("language: unsupported locale '{}'", lang)))?
            .as_str()
            .to_string(),
    };

    let user = state
        .user_service
        .create_student(NewUser {
            username: payload.username,
            email: payload.email,
            name: payload.name,
            language,
            password: payload.password,
        })
        .await?;

    // Every new student starts on the free trial.
    state
        .subscription_service
        .create_trial(user.id, "monthly")
        .await?;

    let token = issue_token(&user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse::bearer(token, user))))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .verify_credentials(&payload.username, &payload.password)
        .await?;
    let token = issue_token(&user)?;
    tracing::info!("User {} logged in", user.username);
    Ok(Json(AuthResponse::bearer(token, user)))
}
