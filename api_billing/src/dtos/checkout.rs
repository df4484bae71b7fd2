use serde::{Deserialize, Serialize};

/// What the hosted checkout charges for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    /// Recurring membership.
    #[default]
    Subscription,
    /// One-off service purchase, members only.
    Payment,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Subscription => "subscription",
            CheckoutMode::Payment => "payment",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSessionRequest {
    #[serde(rename = "priceId", default)]
    pub price_id: Option<String>,
    #[serde(default)]
    pub mode: Option<CheckoutMode>,
}

impl CheckoutSessionRequest {
    /// Trimmed price id, `None` when missing or blank.
    pub fn price_id(&self) -> Option<&str> {
        self.price_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn mode(&self) -> CheckoutMode {
        self.mode.unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_defaults_to_subscription() {
        let req: CheckoutSessionRequest =
            serde_json::from_str(r#"{"priceId":" price_plus "}"#).unwrap();
        assert_eq!(req.price_id(), Some("price_plus"));
        assert_eq!(req.mode(), CheckoutMode::Subscription);
    }

    #[test]
    fn blank_price_is_missing() {
        let req: CheckoutSessionRequest =
            serde_json::from_str(r#"{"priceId":"   ","mode":"payment"}"#).unwrap();
        assert_eq!(req.price_id(), None);
        assert_eq!(req.mode(), CheckoutMode::Payment);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let parsed = serde_json::from_str::<CheckoutSessionRequest>(
            r#"{"priceId":"price_plus","mode":"setup"}"#,
        );
        assert!(parsed.is_err());
    }
}
