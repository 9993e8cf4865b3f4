use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_TRIAL: &str = "trial";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_EXPIRED: &str = "expired";
pub const STATUS_CANCELLED: &str = "cancelled";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub plan_id: String,
    pub trial_started_at: Option<DateTime<Utc>>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_started_at: Option<DateTime<Utc>>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// End of the current entitlement window, depending on status.
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        match self.status.as_str() {
            STATUS_TRIAL => self.trial_ends_at,
            STATUS_ACTIVE => self.subscription_ends_at,
            _ => None,
        }
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        match self.ends_at() {
            Some(end) if end > now => (end - now).num_days(),
            _ => 0,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        matches!(self.ends_at(), Some(end) if end > now)
    }

    /// A trial/active subscription whose window has elapsed should be
    /// flipped to `expired` on the next read.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status.as_str(), STATUS_TRIAL | STATUS_ACTIVE) && !self.is_active(now)
    }
}
