use common::error::Res;
use db::{
    dtos::{
        profile::{CustomerBinding, ProfileBillingUpdate},
        subscription::SubscriptionUpsert,
    },
    models::profile::Profile,
};

use crate::{
    context::BillingContext,
    misc::dates::format_long_date,
    models::event::{BillingEvent, CheckoutCompleted, SubscriptionEvent},
};

/// What a delivered event did to local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Subscription record and profile projection were written.
    Applied,
    /// A newer event for the same subscription was already applied.
    Stale,
    /// No member owns the customer; nothing was written.
    Unresolved,
    Informational,
    Ignored,
}

/// Applies one verified event. Every write is an idempotent keyed upsert, so
/// the caller can ask Stripe to redeliver on any error.
pub async fn process_event(ctx: &BillingContext, event: BillingEvent) -> Res<WebhookOutcome> {
    match event {
        BillingEvent::Subscription(event) => apply_subscription_event(ctx, event).await,
        BillingEvent::CheckoutCompleted(session) => Ok(log_checkout(&session)),
        BillingEvent::Ignored { event_type } => {
            log::debug!("[stripe] ignoring {} event", event_type);
            Ok(WebhookOutcome::Ignored)
        }
    }
}

fn log_checkout(session: &CheckoutCompleted) -> WebhookOutcome {
    if session.is_one_off_payment() {
        log::info!("[stripe] one-off payment completed in session {}", session.session_id);
        WebhookOutcome::Informational
    } else {
        WebhookOutcome::Ignored
    }
}

async fn apply_subscription_event(
    ctx: &BillingContext,
    event: SubscriptionEvent,
) -> Res<WebhookOutcome> {
    let subscription = &event.subscription;

    let Some(owner) = resolve_owner(ctx, &event).await? else {
        log::warn!(
            "[stripe] no member for customer {} (subscription {}, event {}), skipping",
            subscription.customer_id,
            subscription.id,
            event.event_id
        );
        return Ok(WebhookOutcome::Unresolved);
    };

    let record = ctx
        .store
        .upsert_subscription(SubscriptionUpsert {
            user_id: owner.id,
            stripe_customer_id: subscription.customer_id.clone(),
            stripe_subscription_id: subscription.id.clone(),
            price_id: subscription.price_id.clone(),
            status: subscription.status,
            current_period_end: subscription.current_period_end,
            event_at: event.occurred_at,
        })
        .await?;

    if record.is_none() {
        let current = ctx.store.subscription(&subscription.id).await?;
        log::info!(
            "[stripe] event {} for subscription {} is older than the stored state ({} at {})",
            event.event_id,
            subscription.id,
            current.as_ref().map_or("unknown", |r| r.status.as_str()),
            current
                .as_ref()
                .map_or_else(|| "-".to_string(), |r| r.last_event_at.to_rfc3339()),
        );
        return Ok(WebhookOutcome::Stale);
    }

    let plan = subscription
        .price_id
        .as_deref()
        .and_then(|price_id| ctx.plans.lookup(price_id));

    let applied = ctx
        .store
        .update_profile_billing(ProfileBillingUpdate {
            member_id: owner.id,
            stripe_customer_id: subscription.customer_id.clone(),
            membership_plan: plan.map(|p| p.plan.clone()),
            plan_price: plan.map(|p| p.display_price.clone()),
            subscription_status: subscription.status,
            subscription_price_id: subscription.price_id.clone(),
            current_period_end: subscription.current_period_end,
            next_billing_date: subscription.current_period_end.map(format_long_date),
            event_at: event.occurred_at,
        })
        .await?;

    if !applied {
        // the record moved forward but a newer event already projected the profile
        log::info!(
            "[stripe] profile {} already reflects a newer event than {}",
            owner.id,
            event.event_id
        );
        return Ok(WebhookOutcome::Stale);
    }

    log::info!(
        "[stripe] {:?} subscription {} is {} for member {}",
        event.change,
        subscription.id,
        subscription.status,
        owner.id
    );
    Ok(WebhookOutcome::Applied)
}

/// Finds the member a subscription belongs to, first through the stored
/// customer id, then through the member id carried in its metadata.
async fn resolve_owner(ctx: &BillingContext, event: &SubscriptionEvent) -> Res<Option<Profile>> {
    let subscription = &event.subscription;

    if let Some(profile) = ctx
        .store
        .profile_by_customer_id(&subscription.customer_id)
        .await?
    {
        return Ok(Some(profile));
    }

    let Some(member_id) = subscription.member_id else {
        return Ok(None);
    };

    let stored = ctx
        .store
        .bind_customer(CustomerBinding {
            member_id,
            stripe_customer_id: subscription.customer_id.clone(),
            full_name: None,
        })
        .await?;

    if stored != subscription.customer_id {
        log::warn!(
            "[stripe] member {} is bound to {}, not to {} from subscription {}",
            member_id,
            stored,
            subscription.customer_id,
            subscription.id
        );
    } else {
        log::info!(
            "[stripe] linked customer {} to member {} from subscription metadata",
            stored,
            member_id
        );
    }

    ctx.store.profile_by_id(member_id).await
}
