use common::{
    error::{AppError, Res},
    jwt::SessionClaims,
};

use crate::{
    context::BillingContext,
    dtos::checkout::{CheckoutMode, CheckoutSessionRequest},
    services::{customer, gateway::CheckoutSessionParams},
};

pub const SUBSCRIBERS_ONLY: &str = "Services are available to active subscribers only.";

/// Opens a hosted checkout for the member and returns its redirect URL.
///
/// Input and entitlement are checked before anything touches Stripe: a
/// one-off payment needs an active or trialing membership.
pub async fn create_checkout_session(
    ctx: &BillingContext,
    claims: &SessionClaims,
    req: &CheckoutSessionRequest,
) -> Res<String> {
    let price_id = req
        .price_id()
        .ok_or_else(|| AppError::BadRequest("Missing priceId".to_string()))?;
    let mode = req.mode();
    let gateway = ctx.gateway()?;

    let profile = ctx.store.profile_by_id(claims.member_id()).await?;

    if mode == CheckoutMode::Payment
        && !profile.as_ref().is_some_and(|p| p.has_active_subscription())
    {
        log::debug!(
            "member {} tried a one-off purchase without an active membership",
            claims.member_id()
        );
        return Err(AppError::Forbidden(SUBSCRIBERS_ONLY.to_string()));
    }

    let customer_id =
        customer::resolve_customer(ctx, gateway.as_ref(), claims, profile.as_ref()).await?;

    let url = gateway
        .create_checkout_session(CheckoutSessionParams {
            member_id: claims.member_id(),
            customer_id,
            price_id: price_id.to_string(),
            mode,
            success_url: ctx.url("/dashboard?checkout=success"),
            cancel_url: ctx.url("/pricing?checkout=cancel"),
        })
        .await?;

    log::info!(
        "[stripe] {} checkout opened for member {} ({})",
        mode.as_str(),
        claims.member_id(),
        price_id
    );
    Ok(url)
}

/// Opens the hosted billing portal for the member's customer.
pub async fn create_portal_session(ctx: &BillingContext, claims: &SessionClaims) -> Res<String> {
    let gateway = ctx.gateway()?;

    let profile = ctx.store.profile_by_id(claims.member_id()).await?;
    let customer_id =
        customer::resolve_customer(ctx, gateway.as_ref(), claims, profile.as_ref()).await?;

    gateway
        .create_portal_session(&customer_id, &ctx.url("/dashboard/settings"))
        .await
}
