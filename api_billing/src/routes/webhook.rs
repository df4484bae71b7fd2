use actix_web::{HttpRequest, Responder, post, web};
use common::{
    error::{AppError, Res},
    http::Success,
};
use serde_json::json;

use crate::{context::BillingContext, services};

const WEBHOOK_FAILED: &str = "Webhook handling failed";

/// Receives Stripe webhook deliveries.
///
/// Called by Stripe, not by the web app. Register
/// `https://<host>/api/stripe/webhook` in the Stripe dashboard for the
/// `customer.subscription.*` and `checkout.session.completed` events and set
/// its signing secret as `STRIPE_WEBHOOK_SECRET`.
///
/// Returns 200 `{ "received": true }` once the event is applied, 400 for a
/// missing or invalid signature and 500 when processing fails so that Stripe
/// retries the delivery.
#[post("/webhook")]
pub async fn post_webhook(
    payload: String,
    req: HttpRequest,
    ctx: web::Data<BillingContext>,
) -> Res<impl Responder> {
    let Ok(gateway) = ctx.gateway() else {
        return Success::ok(json!({
            "message": "Stripe webhook disabled in this environment."
        }));
    };
    let secret = ctx.webhook_secret()?;

    let signature = match req.headers().get("stripe-signature") {
        Some(signature) => signature.to_str().unwrap_or(""),
        None => return Err(AppError::BadRequest("Missing signature".to_string())),
    };

    let event = gateway
        .construct_event(&payload, signature, secret)
        .map_err(|e| e.conceal(WEBHOOK_FAILED))?;

    let outcome = services::webhook::process_event(&ctx, event)
        .await
        .map_err(|e| e.conceal(WEBHOOK_FAILED))?;
    log::debug!("[stripe] webhook outcome: {:?}", outcome);

    Success::ok(json!({ "received": true }))
}
