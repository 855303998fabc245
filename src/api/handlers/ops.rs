use actix_web::{web, HttpResponse};

use crate::api::errors::{ApiError, ApiResult};
use crate::engine::Engine;

pub async fn metrics(engine: web::Data<Engine>) -> ApiResult<HttpResponse> {
    let buffer = engine
        .metrics
        .render()
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer))
}

pub async fn health(engine: web::Data<Engine>) -> HttpResponse {
    let report = engine.health().await;

    if report.status.is_unhealthy() {
        HttpResponse::ServiceUnavailable().json(report)
    } else {
        HttpResponse::Ok().json(report)
    }
}
