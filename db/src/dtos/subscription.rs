use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::subscription::SubscriptionStatus;

#[derive(Debug, Clone)]
pub struct SubscriptionUpsert {
    pub user_id: Uuid,
    pub stripe_customer_id: String,
    pub stripe_subscription_id: String,
    pub price_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<DateTime<Utc>>,
    /// Creation time of the provider event carrying this state.
    pub event_at: DateTime<Utc>,
}
