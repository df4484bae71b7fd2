use std::sync::Arc;

use async_trait::async_trait;
use common::error::Res;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    dtos::{
        profile::{CustomerBinding, ProfileBillingUpdate},
        subscription::SubscriptionUpsert,
    },
    models::{profile::Profile, subscription::SubscriptionRecord},
};

/// Datastore operations the billing core needs.
#[async_trait]
pub trait BillingStore: Send + Sync {
    async fn profile_by_id(&self, member_id: Uuid) -> Res<Option<Profile>>;

    async fn profile_by_customer_id(&self, stripe_customer_id: &str) -> Res<Option<Profile>>;

    async fn bind_customer(&self, binding: CustomerBinding) -> Res<String>;

    async fn update_profile_billing(&self, update: ProfileBillingUpdate) -> Res<bool>;

    async fn subscription(&self, stripe_subscription_id: &str)
    -> Res<Option<SubscriptionRecord>>;

    async fn upsert_subscription(
        &self,
        data: SubscriptionUpsert,
    ) -> Res<Option<SubscriptionRecord>>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingStore for PgStore {
    async fn profile_by_id(&self, member_id: Uuid) -> Res<Option<Profile>> {
        crate::profile::get_profile_by_id(&*self.pool, member_id).await
    }

    async fn profile_by_customer_id(&self, stripe_customer_id: &str) -> Res<Option<Profile>> {
        crate::profile::get_profile_by_customer_id(&*self.pool, stripe_customer_id).await
    }

    async fn bind_customer(&self, binding: CustomerBinding) -> Res<String> {
        crate::profile::bind_customer(&*self.pool, binding).await
    }

    async fn update_profile_billing(&self, update: ProfileBillingUpdate) -> Res<bool> {
        crate::profile::update_billing(&*self.pool, update).await
    }

    async fn subscription(
        &self,
        stripe_subscription_id: &str,
    ) -> Res<Option<SubscriptionRecord>> {
        crate::subscription::get_subscription(&*self.pool, stripe_subscription_id).await
    }

    async fn upsert_subscription(
        &self,
        data: SubscriptionUpsert,
    ) -> Res<Option<SubscriptionRecord>> {
        crate::subscription::upsert_subscription(&*self.pool, data).await
    }
}
