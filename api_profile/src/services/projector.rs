use chrono::{DateTime, Utc};
use common::{error::Res, jwt::SessionClaims};
use db::models::{profile::Profile, subscription::SubscriptionStatus};

use crate::dtos::profile::{
    DEFAULT_MEMBER_SINCE_MONTHS, DEFAULT_PLAN, DEFAULT_PLAN_PRICE, ProfileView,
};

/// Shown instead of the datastore error when the fallback profile is served.
pub const LOAD_FAILED: &str = "Unable to load your profile";

fn or_default(value: Option<String>, default: &str) -> String {
    non_blank(value).unwrap_or_else(|| default.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_status(raw: Option<String>) -> Option<SubscriptionStatus> {
    let raw = non_blank(raw)?;
    match raw.parse() {
        Ok(status) => Some(status),
        Err(_) => {
            log::debug!("ignoring signup subscription status '{}'", raw);
            None
        }
    }
}

fn parse_period_end(raw: Option<String>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(non_blank(raw)?.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Merges a stored profile over the display defaults.
pub fn from_stored(profile: Profile) -> ProfileView {
    ProfileView {
        id: profile.id,
        full_name: profile.full_name,
        first_name: profile.first_name,
        last_name: profile.last_name,
        phone: profile.phone,
        location: profile.location,
        membership_plan: or_default(profile.membership_plan, DEFAULT_PLAN),
        plan_price: or_default(profile.plan_price, DEFAULT_PLAN_PRICE),
        next_billing_date: profile.next_billing_date,
        payment_last4: profile.payment_last4,
        member_since_months: or_default(profile.member_since_months, DEFAULT_MEMBER_SINCE_MONTHS),
        stripe_customer_id: profile.stripe_customer_id,
        subscription_status: profile.subscription_status,
        subscription_price_id: profile.subscription_price_id,
        current_period_end: profile.current_period_end,
    }
}

/// Builds a profile from what the member entered at signup, for members
/// whose row does not exist yet.
pub fn from_signup(claims: &SessionClaims) -> ProfileView {
    let meta = claims.user_metadata.clone();
    ProfileView {
        id: claims.member_id(),
        full_name: meta.full_name,
        first_name: meta.first_name,
        last_name: meta.last_name,
        phone: meta.phone,
        location: meta.location,
        membership_plan: or_default(meta.membership_plan, DEFAULT_PLAN),
        plan_price: or_default(meta.plan_price, DEFAULT_PLAN_PRICE),
        next_billing_date: meta.next_billing_date,
        payment_last4: meta.payment_last4,
        member_since_months: or_default(meta.member_since_months, DEFAULT_MEMBER_SINCE_MONTHS),
        stripe_customer_id: non_blank(meta.stripe_customer_id),
        subscription_status: parse_status(meta.subscription_status),
        subscription_price_id: non_blank(meta.subscription_price_id),
        current_period_end: parse_period_end(meta.current_period_end),
    }
}

/// Projects the stored lookup result into a view. Never fails: a missing row
/// or a failed read yields the signup-based profile, the latter together with
/// a user-facing error message. Nothing is written back.
pub fn project(
    claims: &SessionClaims,
    stored: Res<Option<Profile>>,
) -> (ProfileView, Option<String>) {
    match stored {
        Ok(Some(profile)) => (from_stored(profile), None),
        Ok(None) => (from_signup(claims), None),
        Err(e) => {
            log::error!("Failed to load profile {}: {}", claims.member_id(), e);
            (from_signup(claims), Some(LOAD_FAILED.to_string()))
        }
    }
}
