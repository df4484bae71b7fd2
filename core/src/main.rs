mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use api_billing::BillingContext;
use api_profile::ProfileContext;
use common::env_config::Config;
use db::{BillingStore, PgStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();

    // init logger
    if config.console_logging_enabled {
        logger::setup(config.is_production()).expect("Failed to set up logger");
    }

    // init db connection
    let pool = db::setup(&config.database_url, config.is_production())
        .await
        .expect("Failed to set up database");
    let store: Arc<dyn BillingStore> = Arc::new(PgStore::new(pool));

    // clients are built once and shared by every worker
    let billing = web::Data::new(BillingContext::from_config(&config, store.clone()));
    let profile = web::Data::new(ProfileContext::new(store));
    log::info!(
        "Billing {} with {} priced plans",
        if billing.is_enabled() { "enabled" } else { "disabled" },
        billing.plans.len()
    );

    let origin = config.cors_allowed_origin.clone();
    let jwt_config = config.jwt_config.clone();

    log::info!(
        "Listening on {}:{} ({})",
        config.server_host,
        config.server_port,
        config.environment
    );

    HttpServer::new(move || {
        App::new()
            .app_data(billing.clone())
            .app_data(profile.clone())
            .wrap(logger::middleware()) // 3rd
            .wrap(auth::session_middleware(jwt_config.clone())) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api")
                    .service(api_billing::mount_stripe())
                    .service(api_profile::mount_profile()),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
