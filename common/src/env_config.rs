use std::{env, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// Holds everything needed to boot the service: database connection,
/// access-token verification, server binding, CORS, logging, and the
/// Stripe integration (which may be intentionally left unconfigured).
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to.
    pub database_url: String,
    /// Configuration for verifying auth provider access tokens.
    pub jwt_config: JwtConfig,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// Public URL of the web application, used for checkout and portal redirects.
    pub app_url: String,
    /// Stripe configuration.
    pub stripe: StripeConfig,
}

#[derive(Clone, Debug)]
/// Configuration for verifying access tokens issued by the auth provider.
pub struct JwtConfig {
    /// The shared secret used to verify token signatures.
    pub secret: String,
    /// Expected `aud` claim.
    pub audience: String,
}

#[derive(Clone, Debug, Default)]
pub struct StripeConfig {
    /// Stripe secret key. Empty means billing is disabled in this deployment.
    pub secret_key: String,
    /// Stripe webhook signing secret. Empty means it was never configured.
    pub webhook_secret: String,
    /// Price ids of the membership tiers, in ascending order.
    pub price_starter: Option<String>,
    pub price_plus: Option<String>,
    pub price_pro: Option<String>,
    pub price_elite: Option<String>,
}

impl StripeConfig {
    pub fn is_enabled(&self) -> bool {
        !self.secret_key.trim().is_empty()
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        let secret = self.webhook_secret.trim();
        (!secret.is_empty()).then_some(secret)
    }

    /// Reads the Stripe settings from environment variables.
    ///
    /// Every value is optional: a missing `STRIPE_SECRET_KEY` turns billing
    /// off instead of failing startup.
    pub fn from_env() -> Self {
        StripeConfig {
            secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            price_starter: non_empty_var("STRIPE_PRICE_STARTER"),
            price_plus: non_empty_var("STRIPE_PRICE_PLUS"),
            price_pro: non_empty_var("STRIPE_PRICE_PRO"),
            price_elite: non_empty_var("STRIPE_PRICE_ELITE"),
        }
    }
}

impl JwtConfig {
    /// Creates a new `JwtConfig` instance from environment variables.
    ///
    /// - `JWT_SECRET`: Required. The auth provider's token signing secret.
    /// - `JWT_AUDIENCE`: Optional. Defaults to `authenticated`.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        JwtConfig {
            secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string()),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `ENVIRONMENT`: `development` or `production`
    /// - `DATABASE_URL`: Connection string for the database
    /// - `JWT_SECRET`: Secret used to verify access tokens
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `APP_URL`: Public web app URL (default: "http://localhost:3000")
    /// - `STRIPE_*`: see [`StripeConfig::from_env`]
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_config: JwtConfig::from_env(),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            app_url: env::var("APP_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            stripe: StripeConfig::from_env(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
