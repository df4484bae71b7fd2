use actix_web::{Responder, post, web};
use common::{error::Res, http::Success, jwt::SessionClaims};

use crate::{
    context::BillingContext,
    dtos::checkout::{CheckoutSessionRequest, UrlResponse},
    services,
};

/// Creates a Stripe Checkout session for the authenticated member.
///
/// # Input
/// - `priceId`: Stripe price id of the membership tier or service
/// - `mode`: (Optional) `"subscription"` (default) or `"payment"`
///
/// # Output
/// - Success: `{ "url": "<hosted checkout url>" }`
/// - Error: 400 without a price id, 403 for one-off purchases without an
///   active membership, 503 when billing is disabled, 500 when Stripe or the
///   datastore fails
#[post("/create-checkout-session")]
pub async fn post_checkout_session(
    claims: web::ReqData<SessionClaims>,
    req: web::Json<CheckoutSessionRequest>,
    ctx: web::Data<BillingContext>,
) -> Res<impl Responder> {
    let url = services::checkout::create_checkout_session(&ctx, &claims, &req)
        .await
        .map_err(|e| e.conceal("Unable to create checkout session"))?;

    Success::ok(UrlResponse { url })
}

/// Creates a Stripe billing portal session so the member can manage their
/// membership and payment methods.
#[post("/create-portal-session")]
pub async fn post_portal_session(
    claims: web::ReqData<SessionClaims>,
    ctx: web::Data<BillingContext>,
) -> Res<impl Responder> {
    let url = services::checkout::create_portal_session(&ctx, &claims)
        .await
        .map_err(|e| e.conceal("Unable to create billing portal session"))?;

    Success::ok(UrlResponse { url })
}
