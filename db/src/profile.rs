use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::profile::{CustomerBinding, ProfileBillingUpdate},
    models::profile::{Profile, ProfileRow},
};

pub async fn get_profile_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    member_id: Uuid,
) -> Res<Option<Profile>> {
    sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE id = $1")
        .bind(member_id)
        .fetch_optional(executor)
        .await?
        .map(Profile::try_from)
        .transpose()
}

pub async fn get_profile_by_customer_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    stripe_customer_id: &str,
) -> Res<Option<Profile>> {
    sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE stripe_customer_id = $1")
        .bind(stripe_customer_id)
        .fetch_optional(executor)
        .await?
        .map(Profile::try_from)
        .transpose()
}

/// Attaches a customer to a member, creating the profile if it does not exist.
/// An already-bound customer id is never replaced; the id that ends up stored
/// is returned so racing callers converge on it.
pub async fn bind_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: CustomerBinding,
) -> Res<String> {
    let stored: Option<String> = sqlx::query_scalar(
        r#"
        INSERT INTO profiles (id, stripe_customer_id, full_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET
            stripe_customer_id = COALESCE(profiles.stripe_customer_id, EXCLUDED.stripe_customer_id),
            full_name = COALESCE(profiles.full_name, EXCLUDED.full_name),
            updated_at = NOW()
        RETURNING stripe_customer_id
        "#,
    )
    .bind(data.member_id)
    .bind(&data.stripe_customer_id)
    .bind(&data.full_name)
    .fetch_one(executor)
    .await?;

    stored.ok_or_else(|| {
        AppError::Internal(format!(
            "profile {} has no customer after binding",
            data.member_id
        ))
    })
}

/// Writes the billing projection unless the profile already reflects an event
/// that orders after this one. Returns whether the row was updated.
pub async fn update_billing<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: ProfileBillingUpdate,
) -> Res<bool> {
    let result = sqlx::query(
        r#"
        UPDATE profiles SET
            stripe_customer_id = COALESCE(stripe_customer_id, $2),
            membership_plan = $3,
            plan_price = $4,
            subscription_status = $5,
            subscription_price_id = $6,
            current_period_end = $7,
            next_billing_date = $8,
            billing_event_at = $9,
            updated_at = NOW()
        WHERE id = $1
          AND (
              COALESCE(billing_event_at, '-infinity'::timestamptz),
              COALESCE(current_period_end, '-infinity'::timestamptz),
              subscription_status_rank(subscription_status)
          ) <= (
              $9,
              COALESCE($7, '-infinity'::timestamptz),
              subscription_status_rank($5)
          )
        "#,
    )
    .bind(data.member_id)
    .bind(&data.stripe_customer_id)
    .bind(&data.membership_plan)
    .bind(&data.plan_price)
    .bind(data.subscription_status.as_str())
    .bind(&data.subscription_price_id)
    .bind(data.current_period_end)
    .bind(&data.next_billing_date)
    .bind(data.event_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
