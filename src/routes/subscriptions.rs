use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;

use crate::dto::subscription_dto::{
    CreatePaymentResponse, PaymentWebhookPayload, SubscribeRequest, SubscriptionView,
};
use crate::dto::MessageResponse;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::utils::signature;
use crate::AppState;

#[axum::debug_handler]
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let plan_id = payload.plan_id.unwrap_or_else(|| "monthly".to_string());
    let subscription = state
        .subscription_service
        .create_trial(user_id, &plan_id)
        .await?;
    let now = crate::utils::time::now();
    Ok((
        StatusCode::CREATED,
        Json(SubscriptionView::derive(subscription, now)),
    ))
}

#[axum::debug_handler]
pub async fn get_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let now = crate::utils::time::now();
    let view = state
        .subscription_service
        .status(user_id)
        .await?
        .map(|s| SubscriptionView::derive(s, now));
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn cancel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    state.subscription_service.cancel(user_id).await?;
    Ok(Json(MessageResponse::new(
        "Subscription cancelled successfully",
    )))
}

#[axum::debug_handler]
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let subscription = state
        .subscription_service
        .status(user_id)
        .await?
        .ok_or_else(|| Error::NotFound("No subscription found for user".to_string()))?;

    let order = state
        .payment_service
        .create_order(user_id, &subscription.plan_id)
        .await?;
    Ok(Json(CreatePaymentResponse {
        payment_id: order.payment_id,
        approval_url: order.approval_url,
    }))
}

/// Signed callback from the payment collaborator. The signature covers the
/// raw body, so the payload is deserialized only after verification.
#[axum::debug_handler]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let provided = headers
        .get("x-payment-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| Error::Unauthorized("missing_payment_signature".to_string()))?;

    let secret = &crate::config::get_config().payment_webhook_secret;
    if !signature::verify(secret, &body, provided) {
        return Err(Error::Unauthorized("invalid_payment_signature".to_string()));
    }

    let payload: PaymentWebhookPayload = serde_json::from_slice(&body)?;
    if payload.event != "payment_completed" {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unexpected_event" })),
        )
            .into_response());
    }

    state
        .subscription_service
        .activate(payload.user_id)
        .await?;
    tracing::info!(
        "Payment {} confirmed for user {}",
        payload.payment_id,
        payload.user_id
    );
    Ok((StatusCode::OK, Json(json!({ "processed": true }))).into_response())
}
