use std::sync::Arc;

use actix_web::web::{self};
use db::BillingStore;

pub mod routes {
    pub mod profile;
}

pub mod services {
    pub mod projector;
}

pub mod dtos {
    pub mod profile;
}

/// Shared state of the profile routes.
pub struct ProfileContext {
    pub store: Arc<dyn BillingStore>,
}

impl ProfileContext {
    pub fn new(store: Arc<dyn BillingStore>) -> Self {
        Self { store }
    }
}

pub fn mount_profile() -> actix_web::Scope<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    web::scope("/profile")
        .wrap(auth::member_middleware())
        .service(routes::profile::get_profile)
}
