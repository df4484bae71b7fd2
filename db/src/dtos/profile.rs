use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::subscription::SubscriptionStatus;

/// Binds a Stripe customer to a member, creating the profile row if needed.
#[derive(Debug, Clone)]
pub struct CustomerBinding {
    pub member_id: Uuid,
    pub stripe_customer_id: String,
    pub full_name: Option<String>,
}

/// Billing projection written onto a profile after a subscription event.
#[derive(Debug, Clone)]
pub struct ProfileBillingUpdate {
    pub member_id: Uuid,
    pub stripe_customer_id: String,
    pub membership_plan: Option<String>,
    pub plan_price: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_price_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub next_billing_date: Option<String>,
    pub event_at: DateTime<Utc>,
}
