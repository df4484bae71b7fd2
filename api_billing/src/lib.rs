use actix_web::web::{self};

pub mod context;

pub mod routes {
    pub mod session;
    pub mod webhook;
}

pub mod services {
    pub mod checkout;
    pub mod customer;
    pub mod gateway;
    pub mod webhook;
}

pub mod dtos {
    pub mod checkout;
}

pub mod models {
    pub mod event;
    pub mod plan;
}

mod misc {
    pub(crate) mod dates;
}

pub use context::BillingContext;

/// Stripe routes. The webhook is authenticated by its signature; checkout
/// and portal sessions need a member session.
pub fn mount_stripe() -> actix_web::Scope {
    web::scope("/stripe")
        .app_data(common::http::json_config())
        .service(routes::webhook::post_webhook)
        .service(
            web::scope("")
                .wrap(auth::member_middleware())
                .service(routes::session::post_checkout_session)
                .service(routes::session::post_portal_session),
        )
}
