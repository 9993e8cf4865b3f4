use crate::error::{Error, Result};
use crate::models::subscription::{
    Subscription, STATUS_ACTIVE, STATUS_CANCELLED, STATUS_EXPIRED, STATUS_TRIAL,
};
use chrono::Duration;
use sqlx::PgPool;
use uuid::Uuid;

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, status, plan_id, trial_started_at, trial_ends_at,
           subscription_started_at, subscription_ends_at, created_at, updated_at
    FROM subscriptions
"#;

#[derive(Clone)]
pub struct SubscriptionService {
    pool: PgPool,
}

impl SubscriptionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Starts the free trial for a user. One subscription per user, ever.
    pub async fn create_trial(&self, user_id: Uuid, plan_id: &str) -> Result<Subscription> {
        if self.find(user_id).await?.is_some() {
            return Err(Error::State(
                "User already has a subscription".to_string(),
            ));
        }

        let config = crate::config::get_config();
        let now = crate::utils::time::now();
        let trial_ends = now + Duration::days(config.trial_days);

        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (
                id, user_id, status, plan_id, trial_started_at, trial_ends_at,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $5, $5)
            RETURNING id, user_id, status, plan_id, trial_started_at, trial_ends_at,
                      subscription_started_at, subscription_ends_at, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(STATUS_TRIAL)
        .bind(plan_id)
        .bind(now)
        .bind(trial_ends)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "Started {}-day trial for user {}",
            config.trial_days,
            user_id
        );
        Ok(subscription)
    }

    /// Current subscription, with overdue trial/active windows flipped to
    /// `expired` on read.
    pub async fn status(&self, user_id: Uuid) -> Result<Option<Subscription>> {
        let Some(mut subscription) = self.find(user_id).await? else {
            return Ok(None);
        };

        let now = crate::utils::time::now();
        if subscription.is_overdue(now) {
            sqlx::query(
                "UPDATE subscriptions SET status = $2, updated_at = NOW() WHERE user_id = $1",
            )
            .bind(user_id)
            .bind(STATUS_EXPIRED)
            .execute(&self.pool)
            .await?;
            subscription.status = STATUS_EXPIRED.to_string();
        }

        Ok(Some(subscription))
    }

    pub async fn cancel(&self, user_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = $2, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(STATUS_CANCELLED)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(
                "No subscription found for user".to_string(),
            ));
        }
        tracing::info!("Subscription cancelled for user {}", user_id);
        Ok(())
    }

    /// Called when the payment collaborator confirms a completed payment:
    /// the subscription becomes active for the configured period.
    pub async fn activate(&self, user_id: Uuid) -> Result<Subscription> {
        let config = crate::config::get_config();
        let now = crate::utils::time::now();
        let ends = now + Duration::days(config.subscription_days);

        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET status = $2, subscription_started_at = $3, subscription_ends_at = $4,
                updated_at = $3
            WHERE user_id = $1
            RETURNING id, user_id, status, plan_id, trial_started_at, trial_ends_at,
                      subscription_started_at, subscription_ends_at, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(STATUS_ACTIVE)
        .bind(now)
        .bind(ends)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("No subscription found for user".to_string()))?;

        tracing::info!("Subscription activated for user {}", user_id);
        Ok(subscription)
    }

    async fn find(&self, user_id: Uuid) -> Result<Option<Subscription>> {
        let query = format!("{} WHERE user_id = $1", SELECT_COLUMNS);
        let subscription = sqlx::query_as::<_, Subscription>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(subscription)
    }
}
