use std::{future::Future, pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures::future::{Ready, ok};

use common::{
    env_config::JwtConfig,
    error::Res,
    jwt::{self, SessionClaims},
};

pub struct SessionMiddleware {
    jwt_config: Rc<JwtConfig>,
}

impl SessionMiddleware {
    pub fn new(jwt_config: JwtConfig) -> Self {
        Self {
            jwt_config: Rc::new(jwt_config),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = SessionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionMiddlewareService {
            service: Arc::new(service),
            jwt_config: self.jwt_config.clone(),
        })
    }
}

pub struct SessionMiddlewareService<S> {
    service: Arc<S>,
    jwt_config: Rc<JwtConfig>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // retrieve token from authorization header
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_owned());

        if let Some(token) = token {
            // claims (or the reason they are missing) travel with the request
            let claims_res = jwt::validate_jwt(&token, &self.jwt_config);
            req.extensions_mut().insert::<Res<SessionClaims>>(claims_res);
        }

        let srv = Arc::clone(&self.service);
        Box::pin(async move { srv.call(req).await.map(|res| res.map_into_boxed_body()) })
    }
}
