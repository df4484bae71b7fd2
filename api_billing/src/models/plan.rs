use std::collections::HashMap;

use common::env_config::StripeConfig;
use serde::Serialize;

/// Display data for a membership tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanInfo {
    pub plan: String,
    pub display_price: String,
}

/// Static lookup from Stripe price id to membership tier.
#[derive(Debug, Clone, Default)]
pub struct PlanCatalog {
    plans: HashMap<String, PlanInfo>,
}

const TIERS: [(&str, &str); 4] = [
    ("Starter", "$9.99/month - Billed monthly"),
    ("Plus", "$39.99/month - Billed monthly"),
    ("Pro", "$99.99/month - Billed monthly"),
    ("Elite", "$249.99/month - Billed monthly"),
];

impl PlanCatalog {
    /// Builds the catalog from the configured tier price ids. Tiers without a
    /// price id are left out.
    pub fn from_config(config: &StripeConfig) -> Self {
        let price_ids = [
            config.price_starter.as_deref(),
            config.price_plus.as_deref(),
            config.price_pro.as_deref(),
            config.price_elite.as_deref(),
        ];

        let plans = price_ids
            .into_iter()
            .zip(TIERS)
            .filter_map(|(price_id, (plan, display_price))| {
                price_id.map(|id| {
                    (
                        id.to_string(),
                        PlanInfo {
                            plan: plan.to_string(),
                            display_price: display_price.to_string(),
                        },
                    )
                })
            })
            .collect();

        PlanCatalog { plans }
    }

    pub fn lookup(&self, price_id: &str) -> Option<&PlanInfo> {
        self.plans.get(price_id)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
