use chrono::{DateTime, Utc};
use db::models::subscription::SubscriptionStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PLAN: &str = "Starter";
pub const DEFAULT_PLAN_PRICE: &str = "$9.99/month - Billed monthly";
pub const DEFAULT_MEMBER_SINCE_MONTHS: &str = "1";

/// Profile as the dashboard renders it. Fields with a display default are
/// always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub membership_plan: String,
    pub plan_price: String,
    pub next_billing_date: Option<String>,
    pub payment_last4: Option<String>,
    pub member_since_months: String,
    pub stripe_customer_id: Option<String>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_price_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: ProfileView,
    /// Set when the stored profile could not be read and `profile` was
    /// rebuilt from signup data instead.
    pub error: Option<String>,
}
