use common::error::Res;
use sqlx::{Executor, Postgres};

use crate::{
    dtos::subscription::SubscriptionUpsert,
    models::subscription::{SubscriptionRecord, SubscriptionRow},
};

pub async fn get_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    stripe_subscription_id: &str,
) -> Res<Option<SubscriptionRecord>> {
    sqlx::query_as::<_, SubscriptionRow>(
        "SELECT * FROM subscriptions WHERE stripe_subscription_id = $1",
    )
    .bind(stripe_subscription_id)
    .fetch_optional(executor)
    .await?
    .map(SubscriptionRecord::try_from)
    .transpose()
}

/// Inserts or updates the record keyed by the Stripe subscription id.
///
/// The update only happens when the incoming event does not order before the
/// last one applied (see [`event_order`]); `None` means the event was stale and
/// nothing changed.
///
/// [`event_order`]: crate::models::subscription::event_order
pub async fn upsert_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: SubscriptionUpsert,
) -> Res<Option<SubscriptionRecord>> {
    sqlx::query_as::<_, SubscriptionRow>(
        r#"
        INSERT INTO subscriptions
            (user_id, stripe_customer_id, stripe_subscription_id, price_id, status, current_period_end, last_event_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (stripe_subscription_id) DO UPDATE SET
            user_id = EXCLUDED.user_id,
            stripe_customer_id = EXCLUDED.stripe_customer_id,
            price_id = EXCLUDED.price_id,
            status = EXCLUDED.status,
            current_period_end = EXCLUDED.current_period_end,
            last_event_at = EXCLUDED.last_event_at,
            updated_at = NOW()
        WHERE (
            subscriptions.last_event_at,
            COALESCE(subscriptions.current_period_end, '-infinity'::timestamptz),
            subscription_status_rank(subscriptions.status)
        ) <= (
            EXCLUDED.last_event_at,
            COALESCE(EXCLUDED.current_period_end, '-infinity'::timestamptz),
            subscription_status_rank(EXCLUDED.status)
        )
        RETURNING *
        "#,
    )
    .bind(data.user_id)
    .bind(&data.stripe_customer_id)
    .bind(&data.stripe_subscription_id)
    .bind(&data.price_id)
    .bind(data.status.as_str())
    .bind(data.current_period_end)
    .bind(data.event_at)
    .fetch_optional(executor)
    .await?
    .map(SubscriptionRecord::try_from)
    .transpose()
}
