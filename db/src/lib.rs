use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgSslMode},
};
use std::{str::FromStr, sync::Arc};

pub mod profile;
pub mod store;
pub mod subscription;

#[cfg(feature = "test-utils")]
pub mod memory;

pub mod models {
    pub mod profile;
    pub mod subscription;
}

pub mod dtos {
    pub mod profile;
    pub mod subscription;
}

pub use store::{BillingStore, PgStore};

type SetupError = Box<dyn std::error::Error>;

fn connect_options(database_url: &str, require_ssl: bool) -> Result<PgConnectOptions, SetupError> {
    let options = PgConnectOptions::from_str(database_url)?;
    Ok(if require_ssl {
        options.ssl_mode(PgSslMode::Require)
    } else {
        options
    })
}

/// Creates the target database through the server's `postgres` database
/// when it does not exist yet.
async fn ensure_database(database_url: &str, require_ssl: bool) -> Result<(), SetupError> {
    let mut url = url::Url::parse(database_url)?;
    let db_name = url.path().trim_start_matches('/').to_string();
    url.set_path("/postgres");

    let admin = PgPool::connect_with(connect_options(url.as_str(), require_ssl)?).await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&admin)
            .await?;

    if !exists {
        log::info!("Creating database {}", db_name);
        sqlx::query(&format!("CREATE DATABASE \"{}\"", db_name.replace('"', "\"\"")))
            .execute(&admin)
            .await?;
    }

    admin.close().await;
    Ok(())
}

/// Connects to Postgres, creating the database if needed, and applies the
/// embedded migrations.
pub async fn setup(database_url: &str, require_ssl: bool) -> Result<Arc<PgPool>, SetupError> {
    ensure_database(database_url, require_ssl).await?;

    let pool = PgPool::connect_with(connect_options(database_url, require_ssl)?).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Database ready, migrations applied");

    Ok(Arc::new(pool))
}
