use actix_web::{Responder, get, web};
use common::{error::Res, http::Success, jwt::SessionClaims};

use crate::{ProfileContext, dtos::profile::ProfileResponse, services::projector};

/// Returns the member's profile for the dashboard.
///
/// Always answers 200 for an authenticated member. Without a stored row the
/// profile is built from signup data; if the datastore cannot be read the
/// same fallback is returned with `error` set.
#[get("")]
pub async fn get_profile(
    claims: web::ReqData<SessionClaims>,
    ctx: web::Data<ProfileContext>,
) -> Res<impl Responder> {
    let stored = ctx.store.profile_by_id(claims.member_id()).await;
    let (profile, error) = projector::project(&claims, stored);

    Success::ok(ProfileResponse { profile, error })
}
