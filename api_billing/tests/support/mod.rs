#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use api_billing::{
    BillingContext,
    models::{
        event::{BillingEvent, SubscriptionChange, SubscriptionEvent, SubscriptionSnapshot},
        plan::PlanCatalog,
    },
    services::gateway::{CheckoutSessionParams, PaymentsGateway},
};
use chrono::{DateTime, Utc};
use common::{
    env_config::{JwtConfig, StripeConfig},
    error::{AppError, Res},
    jwt::{SessionClaims, SignupMetadata, generate_jwt},
};
use db::{BillingStore, memory::InMemoryStore, models::subscription::SubscriptionStatus};
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const VALID_SIGNATURE: &str = "t=1,v1=valid";
pub const APP_URL: &str = "https://app.test";

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    CreateCustomer { member_id: Uuid, email: String },
    Checkout(CheckoutSessionParams),
    Portal { customer_id: String, return_url: String },
}

/// Records every call instead of talking to Stripe. Webhook payloads are
/// `BillingEvent` JSON and only `VALID_SIGNATURE` verifies.
#[derive(Default)]
pub struct FakeGateway {
    calls: Mutex<Vec<GatewayCall>>,
    customers: AtomicUsize,
    fail_checkout: bool,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_checkout() -> Arc<Self> {
        Arc::new(Self {
            fail_checkout: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn customers_created(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GatewayCall::CreateCustomer { .. }))
            .count()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl PaymentsGateway for FakeGateway {
    async fn create_customer(
        &self,
        member_id: Uuid,
        email: &str,
        _name: Option<&str>,
    ) -> Res<String> {
        self.record(GatewayCall::CreateCustomer {
            member_id,
            email: email.to_string(),
        });
        let n = self.customers.fetch_add(1, Ordering::SeqCst) + 1;
        // give racing callers a chance to interleave
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(format!("cus_{}", n))
    }

    async fn create_checkout_session(&self, params: CheckoutSessionParams) -> Res<String> {
        self.record(GatewayCall::Checkout(params));
        if self.fail_checkout {
            return Err(AppError::Internal("stripe is down".to_string()));
        }
        Ok("https://checkout.stripe.test/c/pay/cs_test_1".to_string())
    }

    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Res<String> {
        self.record(GatewayCall::Portal {
            customer_id: customer_id.to_string(),
            return_url: return_url.to_string(),
        });
        Ok(format!("https://billing.stripe.test/p/session/{}", customer_id))
    }

    fn construct_event(
        &self,
        payload: &str,
        signature: &str,
        secret: &str,
    ) -> Res<BillingEvent> {
        if signature != VALID_SIGNATURE || secret != WEBHOOK_SECRET {
            return Err(AppError::BadRequest("Invalid signature".to_string()));
        }
        serde_json::from_str(payload)
            .map_err(|e| AppError::Internal(format!("undecodable event: {}", e)))
    }
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret".to_string(),
        audience: "authenticated".to_string(),
    }
}

pub fn claims_for(member_id: Uuid) -> SessionClaims {
    SessionClaims {
        sub: member_id,
        email: Some("ada@example.com".to_string()),
        aud: "authenticated".to_string(),
        exp: (Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        user_metadata: SignupMetadata {
            full_name: Some("Ada Lovelace".to_string()),
            ..Default::default()
        },
    }
}

pub fn bearer(member_id: Uuid) -> (&'static str, String) {
    let token = generate_jwt(&claims_for(member_id), &jwt_config()).unwrap();
    ("Authorization", format!("Bearer {}", token))
}

pub fn catalog() -> PlanCatalog {
    PlanCatalog::from_config(&StripeConfig {
        price_starter: Some("price_starter".to_string()),
        price_plus: Some("price_plus".to_string()),
        price_pro: Some("price_pro".to_string()),
        price_elite: Some("price_elite".to_string()),
        ..Default::default()
    })
}

pub fn context(store: &Arc<InMemoryStore>, gateway: Option<&Arc<FakeGateway>>) -> BillingContext {
    BillingContext::new(
        store.clone() as Arc<dyn BillingStore>,
        gateway.map(|g| g.clone() as Arc<dyn PaymentsGateway>),
        Some(WEBHOOK_SECRET.to_string()),
        catalog(),
        APP_URL,
    )
}

pub fn context_without_secret(store: &Arc<InMemoryStore>, gateway: &Arc<FakeGateway>) -> BillingContext {
    BillingContext::new(
        store.clone() as Arc<dyn BillingStore>,
        Some(gateway.clone() as Arc<dyn PaymentsGateway>),
        None,
        catalog(),
        APP_URL,
    )
}

/// Builds the `/api` app with the billing routes mounted the way `main` does.
macro_rules! billing_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx))
                .wrap(auth::session_middleware(support::jwt_config()))
                .service(actix_web::web::scope("/api").service(api_billing::mount_stripe())),
        )
        .await
    };
}

pub struct SubscriptionFixture {
    pub subscription_id: &'static str,
    pub customer_id: &'static str,
    pub price_id: &'static str,
    pub status: SubscriptionStatus,
    pub period_end: i64,
    pub member_id: Option<Uuid>,
}

impl Default for SubscriptionFixture {
    fn default() -> Self {
        SubscriptionFixture {
            subscription_id: "sub_1",
            customer_id: "cus_1",
            price_id: "price_plus",
            status: SubscriptionStatus::Active,
            // March 4, 2026
            period_end: 1_772_582_400,
            member_id: None,
        }
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

/// Webhook payload for a subscription event created at `created` (unix secs).
pub fn subscription_event(
    event_id: &str,
    change: SubscriptionChange,
    created: i64,
    fixture: SubscriptionFixture,
) -> String {
    let event = BillingEvent::Subscription(SubscriptionEvent {
        event_id: event_id.to_string(),
        change,
        occurred_at: at(created),
        subscription: SubscriptionSnapshot {
            id: fixture.subscription_id.to_string(),
            customer_id: fixture.customer_id.to_string(),
            price_id: Some(fixture.price_id.to_string()),
            status: fixture.status,
            current_period_end: Some(at(fixture.period_end)),
            member_id: fixture.member_id,
        },
    });
    serde_json::to_string(&event).unwrap()
}
