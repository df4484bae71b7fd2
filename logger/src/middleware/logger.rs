use std::sync::Arc;
use std::time::Instant;

use actix_web::{
    Error, HttpMessage,
    body::MessageBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use colored::{Color, Colorize};
use common::{error::Res, jwt::SessionClaims};
use futures::future::{LocalBoxFuture, Ready, ready};
use log::{Level, log};

/// Logs one line per request: status, method, path, latency and member.
pub struct LoggerMiddleware {}

impl LoggerMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for LoggerMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = LoggerMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService {
            service: Arc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let member = member_of(&req);
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            let res = srv.call(req).await?;
            let status = res.status();

            // failures stand out in the log stream, the rest stays at info
            let level = if status.is_server_error() {
                Level::Error
            } else if status.is_client_error() {
                Level::Warn
            } else {
                Level::Info
            };

            log!(
                level,
                "[{}] {} {} {} member_id={}",
                status.as_u16().to_string().color(status_color(status.as_u16())),
                method.bold(),
                path.bright_white(),
                format!("({}ms)", started.elapsed().as_millis()).bright_black(),
                member.as_deref().unwrap_or("-").bright_blue(),
            );

            Ok(res)
        })
    }
}

/// Member id decoded by the session middleware, which runs before this one.
fn member_of(req: &ServiceRequest) -> Option<String> {
    req.extensions()
        .get::<Res<SessionClaims>>()
        .and_then(|claims| claims.as_ref().ok())
        .map(|claims| claims.member_id().to_string())
}

fn status_color(status: u16) -> Color {
    match status {
        200..=299 => Color::Green,
        300..=399 => Color::Yellow,
        400..=499 => Color::BrightRed,
        _ => Color::Red,
    }
}
