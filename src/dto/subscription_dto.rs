use crate::models::subscription::Subscription;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub plan_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    pub id: Uuid,
    pub status: String,
    pub plan_id: String,
    pub days_remaining: i64,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_ends_at: Option<DateTime<Utc>>,
}

impl SubscriptionView {
    pub fn derive(subscription: Subscription, now: DateTime<Utc>) -> Self {
        Self {
            days_remaining: subscription.days_remaining(now),
            is_active: subscription.is_active(now),
            id: subscription.id,
            status: subscription.status,
            plan_id: subscription.plan_id,
            trial_ends_at: subscription.trial_ends_at,
            subscription_ends_at: subscription.subscription_ends_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentResponse {
    pub payment_id: String,
    pub approval_url: String,
}

/// Body of the signed callback from the payment collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookPayload {
    pub event: String,
    pub payment_id: String,
    pub user_id: Uuid,
}
