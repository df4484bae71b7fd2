use actix_web::HttpResponse;
use thiserror::Error;

pub type Res<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    JWT(#[from] jsonwebtoken::errors::Error),

    #[error("Stripe error: {0}")]
    Stripe(#[from] stripe::StripeError),

    // === APPLICATION ERRORS ===
    #[error("Authorization error: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    BillingDisabled(String),

    #[error("{0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Integration failures are the ones caused by a downstream system
    /// (datastore, payments provider) rather than by the caller.
    pub fn is_integration_failure(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::Stripe(_)
                | AppError::MalformedRow(_)
                | AppError::Internal(_)
        )
    }

    /// Replaces an integration failure with a generic `Upstream` error carrying
    /// `message`, logging the original. Caller-facing errors pass through.
    pub fn conceal(self, message: &str) -> AppError {
        if self.is_integration_failure() {
            log::error!("{}: {}", message, self);
            AppError::Upstream(message.to_string())
        } else {
            self
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        let is_dev = cfg!(debug_assertions);

        let to_internal_json = |err_msg: &str| {
            if is_dev {
                serde_json::json!({ "error": err_msg })
            } else {
                serde_json::json!({ "error": "Internal server error" })
            }
        };

        match self {
            // === CONVERSION ERRORS ===
            AppError::Database(error) => {
                log::error!("Database error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::JWT(error) => {
                log::debug!("JWT error: {}", error);
                HttpResponse::Unauthorized().json(serde_json::json!({ "error": "Invalid token" }))
            }
            AppError::Stripe(error) => {
                log::error!("Stripe error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }

            // === APPLICATION ERRORS ===
            AppError::Unauthorized(_) => {
                HttpResponse::Unauthorized().json(serde_json::json!({ "error": self.to_string() }))
            }
            AppError::Forbidden(_) => {
                HttpResponse::Forbidden().json(serde_json::json!({ "error": self.to_string() }))
            }
            AppError::NotFound(_) => {
                HttpResponse::NotFound().json(serde_json::json!({ "error": self.to_string() }))
            }
            AppError::BadRequest(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": self.to_string() }))
            }
            AppError::BillingDisabled(_) => HttpResponse::ServiceUnavailable()
                .json(serde_json::json!({ "error": self.to_string() })),

            // already logged by `conceal`, the message is safe to show
            AppError::Upstream(_) => HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": self.to_string() })),

            AppError::Configuration(error) => {
                log::error!("Configuration error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&self.to_string()))
            }
            AppError::MalformedRow(error) => {
                log::error!("Malformed row: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&self.to_string()))
            }
            AppError::Internal(error) => {
                log::error!("Internal error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(error))
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}
