use std::{future::Future, pin::Pin, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures::future::{Ready, ok};

use common::jwt::get_session_claims_or_error;

pub struct MemberGuard {}

impl MemberGuard {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for MemberGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for MemberGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = MemberGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(MemberGuardService {
            service: Arc::new(service),
        })
    }
}

pub struct MemberGuardService<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for MemberGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match get_session_claims_or_error(&req) {
            Ok(claims) => {
                // handlers read the member through `web::ReqData<SessionClaims>`
                req.extensions_mut().insert(claims);
                let srv = Arc::clone(&self.service);
                Box::pin(async move { srv.call(req).await.map(|res| res.map_into_boxed_body()) })
            }
            Err(response) => {
                log::debug!("Rejected request without a member session: {}", req.path());
                let response = response.map_into_boxed_body();
                Box::pin(async move { Ok(req.into_response(response)) })
            }
        }
    }
}
