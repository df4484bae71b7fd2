//! In-memory [`BillingStore`] with the same conflict rules as the Postgres
//! queries. Enabled with the `test-utils` feature.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use common::error::{AppError, Res};
use uuid::Uuid;

use crate::{
    dtos::{
        profile::{CustomerBinding, ProfileBillingUpdate},
        subscription::SubscriptionUpsert,
    },
    models::{
        profile::Profile,
        subscription::{SubscriptionRecord, event_order},
    },
    store::BillingStore,
};

#[derive(Default)]
pub struct InMemoryStore {
    profiles: Mutex<HashMap<Uuid, Profile>>,
    subscriptions: Mutex<HashMap<String, SubscriptionRecord>>,
    writes: AtomicUsize,
    fail_reads: Mutex<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        let store = Self::new();
        {
            let mut map = store.profiles.lock().unwrap();
            for profile in profiles {
                map.insert(profile.id, profile);
            }
        }
        store
    }

    /// Makes every subsequent read fail as if the database were unreachable.
    pub fn fail_reads(&self) {
        *self.fail_reads.lock().unwrap() = true;
    }

    /// Number of successful mutating calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn profile(&self, member_id: Uuid) -> Option<Profile> {
        self.profiles.lock().unwrap().get(&member_id).cloned()
    }

    pub fn subscription_record(&self, stripe_subscription_id: &str) -> Option<SubscriptionRecord> {
        self.subscriptions
            .lock()
            .unwrap()
            .get(stripe_subscription_id)
            .cloned()
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }

    fn check_reads(&self) -> Res<()> {
        if *self.fail_reads.lock().unwrap() {
            return Err(AppError::Internal("in-memory store is offline".to_string()));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BillingStore for InMemoryStore {
    async fn profile_by_id(&self, member_id: Uuid) -> Res<Option<Profile>> {
        self.check_reads()?;
        Ok(self.profile(member_id))
    }

    async fn profile_by_customer_id(&self, stripe_customer_id: &str) -> Res<Option<Profile>> {
        self.check_reads()?;
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .find(|p| p.stripe_customer_id.as_deref() == Some(stripe_customer_id))
            .cloned())
    }

    async fn bind_customer(&self, binding: CustomerBinding) -> Res<String> {
        let mut profiles = self.profiles.lock().unwrap();

        let taken = profiles.values().any(|p| {
            p.id != binding.member_id
                && p.stripe_customer_id.as_deref() == Some(binding.stripe_customer_id.as_str())
        });
        if taken {
            return Err(AppError::Internal(format!(
                "duplicate key value violates unique constraint on stripe_customer_id {}",
                binding.stripe_customer_id
            )));
        }

        let now = Utc::now();
        let profile = profiles
            .entry(binding.member_id)
            .or_insert_with(|| Profile::blank(binding.member_id, now));
        if profile.stripe_customer_id.is_none() {
            profile.stripe_customer_id = Some(binding.stripe_customer_id);
        }
        if profile.full_name.is_none() {
            profile.full_name = binding.full_name;
        }
        profile.updated_at = now;

        let stored = profile.stripe_customer_id.clone().unwrap_or_default();
        drop(profiles);
        self.record_write();
        Ok(stored)
    }

    async fn update_profile_billing(&self, update: ProfileBillingUpdate) -> Res<bool> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.get_mut(&update.member_id) else {
            return Ok(false);
        };
        let incoming = event_order(
            update.event_at,
            update.current_period_end,
            Some(update.subscription_status),
        );
        let newer_applied = profile.billing_event_at.is_some_and(|applied| {
            event_order(
                applied,
                profile.current_period_end,
                profile.subscription_status,
            ) > incoming
        });
        if newer_applied {
            return Ok(false);
        }

        if profile.stripe_customer_id.is_none() {
            profile.stripe_customer_id = Some(update.stripe_customer_id);
        }
        profile.membership_plan = update.membership_plan;
        profile.plan_price = update.plan_price;
        profile.subscription_status = Some(update.subscription_status);
        profile.subscription_price_id = update.subscription_price_id;
        profile.current_period_end = update.current_period_end;
        profile.next_billing_date = update.next_billing_date;
        profile.billing_event_at = Some(update.event_at);
        profile.updated_at = Utc::now();

        drop(profiles);
        self.record_write();
        Ok(true)
    }

    async fn subscription(
        &self,
        stripe_subscription_id: &str,
    ) -> Res<Option<SubscriptionRecord>> {
        self.check_reads()?;
        Ok(self.subscription_record(stripe_subscription_id))
    }

    async fn upsert_subscription(
        &self,
        data: SubscriptionUpsert,
    ) -> Res<Option<SubscriptionRecord>> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let now = Utc::now();

        let record = match subscriptions.get_mut(&data.stripe_subscription_id) {
            Some(existing)
                if event_order(
                    existing.last_event_at,
                    existing.current_period_end,
                    Some(existing.status),
                ) > event_order(data.event_at, data.current_period_end, Some(data.status)) =>
            {
                return Ok(None);
            }
            Some(existing) => {
                existing.user_id = data.user_id;
                existing.stripe_customer_id = data.stripe_customer_id;
                existing.price_id = data.price_id;
                existing.status = data.status;
                existing.current_period_end = data.current_period_end;
                existing.last_event_at = data.event_at;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let record = SubscriptionRecord {
                    id: Uuid::new_v4(),
                    user_id: data.user_id,
                    stripe_customer_id: data.stripe_customer_id,
                    stripe_subscription_id: data.stripe_subscription_id.clone(),
                    price_id: data.price_id,
                    status: data.status,
                    current_period_end: data.current_period_end,
                    last_event_at: data.event_at,
                    created_at: now,
                    updated_at: now,
                };
                subscriptions.insert(data.stripe_subscription_id, record.clone());
                record
            }
        };

        drop(subscriptions);
        self.record_write();
        Ok(Some(record))
    }
}
