use chrono::{DateTime, Utc};
use common::error::AppError;
use serde::Serialize;
use uuid::Uuid;

use super::subscription::SubscriptionStatus;

/// Raw `profiles` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub membership_plan: Option<String>,
    pub plan_price: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_price_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub next_billing_date: Option<String>,
    pub payment_last4: Option<String>,
    pub member_since_months: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub billing_event_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A member profile with its billing projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub membership_plan: Option<String>,
    pub plan_price: Option<String>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_price_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub next_billing_date: Option<String>,
    pub payment_last4: Option<String>,
    pub member_since_months: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub billing_event_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// An empty profile row, as the datastore creates it on first insert.
    pub fn blank(id: Uuid, now: DateTime<Utc>) -> Self {
        Profile {
            id,
            full_name: None,
            first_name: None,
            last_name: None,
            phone: None,
            location: None,
            membership_plan: None,
            plan_price: None,
            subscription_status: None,
            subscription_price_id: None,
            current_period_end: None,
            next_billing_date: None,
            payment_last4: None,
            member_since_months: None,
            stripe_customer_id: None,
            billing_event_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_active_subscription(&self) -> bool {
        self.subscription_status
            .is_some_and(|status| status.is_active())
    }
}

impl TryFrom<ProfileRow> for Profile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let subscription_status = row
            .subscription_status
            .as_deref()
            .map(str::parse::<SubscriptionStatus>)
            .transpose()?;

        Ok(Profile {
            id: row.id,
            full_name: row.full_name,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            location: row.location,
            membership_plan: row.membership_plan,
            plan_price: row.plan_price,
            subscription_status,
            subscription_price_id: row.subscription_price_id,
            current_period_end: row.current_period_end,
            next_billing_date: row.next_billing_date,
            payment_last4: row.payment_last4,
            member_since_months: row.member_since_months,
            stripe_customer_id: row.stripe_customer_id,
            billing_event_at: row.billing_event_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
