use std::sync::Arc;

use common::{error::Res, jwt::SessionClaims};
use dashmap::DashMap;
use db::{dtos::profile::CustomerBinding, models::profile::Profile};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{context::BillingContext, services::gateway::PaymentsGateway};

/// Per-member locks serializing customer creation inside one process.
#[derive(Clone, Default)]
pub struct CustomerLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl CustomerLocks {
    fn lock_for(&self, member_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(member_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the entry once nobody else holds or waits on it.
    fn release(&self, member_id: Uuid) {
        self.locks
            .remove_if(&member_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Returns the member's Stripe customer id, creating and binding one if the
/// profile has none yet.
///
/// Concurrent callers for the same member wait on one lock and re-read the
/// profile, so only the first creates a customer. Across processes the
/// conditional bind keeps whichever id was stored first; a customer created
/// by the losing side is logged as orphaned.
pub async fn resolve_customer(
    ctx: &BillingContext,
    gateway: &dyn PaymentsGateway,
    claims: &SessionClaims,
    profile: Option<&Profile>,
) -> Res<String> {
    if let Some(id) = profile.and_then(|p| p.stripe_customer_id.clone()) {
        return Ok(id);
    }

    let member_id = claims.member_id();
    let lock = ctx.customer_locks.lock_for(member_id);
    let result = {
        let _guard = lock.lock().await;
        create_and_bind(ctx, gateway, claims).await
    };
    drop(lock);
    ctx.customer_locks.release(member_id);

    result
}

async fn create_and_bind(
    ctx: &BillingContext,
    gateway: &dyn PaymentsGateway,
    claims: &SessionClaims,
) -> Res<String> {
    let member_id = claims.member_id();

    let current = ctx.store.profile_by_id(member_id).await?;
    if let Some(id) = current.as_ref().and_then(|p| p.stripe_customer_id.clone()) {
        return Ok(id);
    }

    let name = current
        .as_ref()
        .and_then(|p| p.full_name.clone())
        .or_else(|| claims.display_name());

    let created = gateway
        .create_customer(member_id, claims.email(), name.as_deref())
        .await?;
    log::info!("[stripe] created customer {} for member {}", created, member_id);

    let stored = ctx
        .store
        .bind_customer(CustomerBinding {
            member_id,
            stripe_customer_id: created.clone(),
            full_name: name,
        })
        .await?;

    if stored != created {
        log::warn!(
            "[stripe] customer {} is orphaned, member {} is already bound to {}",
            created,
            member_id,
            stored
        );
    }

    Ok(stored)
}
