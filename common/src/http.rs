use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;

use crate::error::{AppError, Res};

pub struct Success;
impl Success {
    pub fn created<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Created().json(body))
    }
    pub fn ok<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Ok().json(body))
    }
}

/// JSON extractor config that reports undecodable bodies in the same
/// `{"error": ...}` shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        log::debug!("[http] rejected body for {}: {}", req.path(), err);
        AppError::BadRequest("Invalid request body".to_string()).into()
    })
}
