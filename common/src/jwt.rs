use actix_web::{HttpMessage, HttpResponse, dev::ServiceRequest};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    env_config::JwtConfig,
    error::{AppError, Res},
};

/// Claims of an access token issued by the auth provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Member id (auth subject).
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize,
    #[serde(default)]
    pub user_metadata: SignupMetadata,
}

/// Free-form metadata captured at signup. Every field is optional, and the
/// billing fields stay raw strings so a malformed value cannot invalidate the
/// whole session.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SignupMetadata {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub membership_plan: Option<String>,
    pub plan_price: Option<String>,
    pub next_billing_date: Option<String>,
    pub payment_last4: Option<String>,
    pub member_since_months: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_price_id: Option<String>,
    /// RFC 3339 timestamp.
    pub current_period_end: Option<String>,
}

impl SessionClaims {
    pub fn member_id(&self) -> Uuid {
        self.sub
    }

    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    /// Best display name from signup metadata, if any.
    pub fn display_name(&self) -> Option<String> {
        let meta = &self.user_metadata;
        if let Some(full) = meta.full_name.as_ref().filter(|n| !n.trim().is_empty()) {
            return Some(full.trim().to_string());
        }
        let joined = [meta.first_name.as_deref(), meta.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    }
}

/// Signs claims with the shared secret. The service itself never issues
/// tokens in production; this exists for local tooling and tests.
pub fn generate_jwt(claims: &SessionClaims, config: &JwtConfig) -> Res<String> {
    jsonwebtoken::encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(AppError::from)
}

/// Verifies signature, expiry and audience of an access token and returns its claims.
pub fn validate_jwt(token: &str, config: &JwtConfig) -> Res<SessionClaims> {
    let mut validation = Validation::default();
    validation.set_audience(&[config.audience.as_str()]);

    let token_data = jsonwebtoken::decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

pub fn get_session_claims_or_error(req: &ServiceRequest) -> Result<SessionClaims, HttpResponse> {
    if let Some(claims_res) = req.extensions().get::<Res<SessionClaims>>() {
        match claims_res {
            Ok(claims) => Ok(claims.clone()),
            Err(app_error) => Err(app_error.to_http_response()),
        }
    } else {
        Err(AppError::Unauthorized("Not authenticated".to_string()).to_http_response())
    }
}
