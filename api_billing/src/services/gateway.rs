use std::collections::HashMap;

use async_trait::async_trait;
use common::{
    error::{AppError, Res},
    stripe as stripe_common,
};
use stripe::{
    BillingPortalSession, CheckoutSession, CheckoutSessionMode, Client,
    CreateBillingPortalSession, CreateCheckoutSession, CreateCheckoutSessionAutomaticTax,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionPaymentIntentData,
    CreateCheckoutSessionSubscriptionData, Webhook,
};
use uuid::Uuid;

use crate::{dtos::checkout::CheckoutMode, models::event::BillingEvent};

/// Everything needed to open a hosted checkout for one price.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionParams {
    pub member_id: Uuid,
    pub customer_id: String,
    pub price_id: String,
    pub mode: CheckoutMode,
    pub success_url: String,
    pub cancel_url: String,
}

/// Payments provider operations used by the billing core.
#[async_trait]
pub trait PaymentsGateway: Send + Sync {
    /// Creates a billing customer and returns its id.
    async fn create_customer(&self, member_id: Uuid, email: &str, name: Option<&str>)
    -> Res<String>;

    /// Creates a hosted checkout session and returns its redirect URL.
    async fn create_checkout_session(&self, params: CheckoutSessionParams) -> Res<String>;

    /// Creates a hosted billing-portal session and returns its URL.
    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Res<String>;

    /// Verifies the webhook signature and decodes the event.
    fn construct_event(&self, payload: &str, signature: &str, secret: &str)
    -> Res<BillingEvent>;
}

pub struct StripeGateway {
    client: Client,
}

impl StripeGateway {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: stripe_common::create_client(secret_key),
        }
    }
}

#[async_trait]
impl PaymentsGateway for StripeGateway {
    async fn create_customer(
        &self,
        member_id: Uuid,
        email: &str,
        name: Option<&str>,
    ) -> Res<String> {
        let customer = stripe_common::create_customer(&self.client, member_id, email, name).await?;
        Ok(customer.id.to_string())
    }

    async fn create_checkout_session(&self, params: CheckoutSessionParams) -> Res<String> {
        let member_id = params.member_id.to_string();
        let customer = stripe_common::parse_customer_id(&params.customer_id)?;

        let session_params = CreateCheckoutSession {
            mode: Some(match params.mode {
                CheckoutMode::Subscription => CheckoutSessionMode::Subscription,
                CheckoutMode::Payment => CheckoutSessionMode::Payment,
            }),
            customer: Some(customer),
            line_items: Some(vec![CreateCheckoutSessionLineItems {
                price: Some(params.price_id.clone()),
                quantity: Some(1),
                ..Default::default()
            }]),
            allow_promotion_codes: Some(true),
            automatic_tax: Some(CreateCheckoutSessionAutomaticTax {
                enabled: true,
                ..Default::default()
            }),
            success_url: Some(params.success_url.as_str()),
            cancel_url: Some(params.cancel_url.as_str()),
            metadata: Some(HashMap::from([
                ("user_id".to_string(), member_id.clone()),
                ("mode".to_string(), params.mode.as_str().to_string()),
            ])),
            // the subscription carries the member id so its webhooks can
            // re-attach the customer if the profile link is missing
            subscription_data: (params.mode == CheckoutMode::Subscription).then(|| {
                CreateCheckoutSessionSubscriptionData {
                    metadata: Some(HashMap::from([("user_id".to_string(), member_id.clone())])),
                    ..Default::default()
                }
            }),
            payment_intent_data: (params.mode == CheckoutMode::Payment).then(|| {
                CreateCheckoutSessionPaymentIntentData {
                    metadata: Some(HashMap::from([
                        ("user_id".to_string(), member_id.clone()),
                        ("price_id".to_string(), params.price_id.clone()),
                    ])),
                    ..Default::default()
                }
            }),
            ..Default::default()
        };

        let session = CheckoutSession::create(&self.client, session_params)
            .await
            .map_err(AppError::from)?;

        session.url.ok_or_else(|| {
            AppError::Internal(format!("checkout session {} has no url", session.id))
        })
    }

    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Res<String> {
        let customer = stripe_common::parse_customer_id(customer_id)?;
        let mut params = CreateBillingPortalSession::new(customer);
        params.return_url = Some(return_url);

        let session = BillingPortalSession::create(&self.client, params)
            .await
            .map_err(AppError::from)?;
        Ok(session.url)
    }

    fn construct_event(
        &self,
        payload: &str,
        signature: &str,
        secret: &str,
    ) -> Res<BillingEvent> {
        let event = match Webhook::construct_event(payload, signature, secret) {
            Ok(event) => event,
            Err(e) => {
                log::error!("[stripe] webhook signature verification failed: {}", e);
                return Err(AppError::BadRequest("Invalid signature".to_string()));
            }
        };
        BillingEvent::try_from(event)
    }
}
