use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

pub const MONTHLY_PRICE_USD: &str = "10.00";

/// Thin client for the payment collaborator. The backend never talks to the
/// actual processor; it asks the collaborator for an order and receives the
/// confirmation back on the signed webhook.
#[derive(Clone)]
pub struct PaymentService {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    user_id: Uuid,
    plan_id: &'a str,
    amount: &'a str,
    currency: &'a str,
    description: &'a str,
    return_url: String,
    cancel_url: String,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    approval_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentOrder {
    pub payment_id: String,
    pub approval_url: String,
}

impl PaymentService {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    pub async fn create_order(&self, user_id: Uuid, plan_id: &str) -> Result<PaymentOrder> {
        let config = crate::config::get_config();
        let request = CreateOrderRequest {
            user_id,
            plan_id,
            amount: MONTHLY_PRICE_USD,
            currency: "USD",
            description: "Monthly subscription to the Arborist Study Platform",
            return_url: format!("{}/payment/success", config.frontend_url),
            cancel_url: format!("{}/payment/cancel", config.frontend_url),
        };

        let response = self
            .http
            .post(format!("{}/orders", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<CreateOrderResponse>()
            .await?;

        let approval = Url::parse(&response.approval_url).map_err(|_| {
            Error::Internal("Payment collaborator returned an invalid approval URL".to_string())
        })?;
        if approval.scheme() != "http" && approval.scheme() != "https" {
            return Err(Error::Internal(
                "Payment collaborator returned an invalid approval URL".to_string(),
            ));
        }

        Ok(PaymentOrder {
            payment_id: response.id,
            approval_url: response.approval_url,
        })
    }
}
