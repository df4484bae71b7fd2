use std::sync::Arc;

use common::{
    env_config::Config,
    error::{AppError, Res},
};
use db::BillingStore;

use crate::{
    models::plan::PlanCatalog,
    services::{
        customer::CustomerLocks,
        gateway::{PaymentsGateway, StripeGateway},
    },
};

/// Shared state of the billing routes, registered once as `web::Data`.
pub struct BillingContext {
    pub store: Arc<dyn BillingStore>,
    /// `None` when billing is disabled in this deployment.
    gateway: Option<Arc<dyn PaymentsGateway>>,
    webhook_secret: Option<String>,
    pub plans: PlanCatalog,
    pub app_url: String,
    pub customer_locks: CustomerLocks,
}

impl BillingContext {
    pub fn new(
        store: Arc<dyn BillingStore>,
        gateway: Option<Arc<dyn PaymentsGateway>>,
        webhook_secret: Option<String>,
        plans: PlanCatalog,
        app_url: impl Into<String>,
    ) -> Self {
        BillingContext {
            store,
            gateway,
            webhook_secret,
            plans,
            app_url: app_url.into().trim_end_matches('/').to_string(),
            customer_locks: CustomerLocks::default(),
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn BillingStore>) -> Self {
        let gateway = config.stripe.is_enabled().then(|| {
            Arc::new(StripeGateway::new(&config.stripe.secret_key)) as Arc<dyn PaymentsGateway>
        });

        if gateway.is_none() {
            log::warn!("STRIPE_SECRET_KEY is not set, billing is disabled");
        }

        Self::new(
            store,
            gateway,
            config.stripe.webhook_secret().map(str::to_string),
            PlanCatalog::from_config(&config.stripe),
            config.app_url.clone(),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.gateway.is_some()
    }

    pub fn gateway(&self) -> Res<&Arc<dyn PaymentsGateway>> {
        self.gateway
            .as_ref()
            .ok_or_else(|| AppError::BillingDisabled("Billing is disabled".to_string()))
    }

    pub fn webhook_secret(&self) -> Res<&str> {
        self.webhook_secret.as_deref().ok_or_else(|| {
            AppError::Configuration("STRIPE_WEBHOOK_SECRET is not configured".to_string())
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.app_url, path)
    }
}
