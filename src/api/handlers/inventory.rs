use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::api::errors::ApiResult;
use crate::domain::booking::ServiceSpec;
use crate::domain::inventory::VariantSpec;
use crate::engine::Engine;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub async fn get_variant(
    engine: web::Data<Engine>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let variant = engine.inventory.get_variant(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(variant))
}

pub async fn get_availability(
    engine: web::Data<Engine>,
    _user: CurrentUser,
    path: web::Path<Uuid>,
    query: web::Query<AvailabilityQuery>,
) -> ApiResult<HttpResponse> {
    let availability = engine
        .inventory
        .get_availability(path.into_inner(), query.start, query.end)
        .await?;
    Ok(HttpResponse::Ok().json(availability))
}

pub async fn upsert_variant(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<VariantSpec>,
) -> ApiResult<HttpResponse> {
    let variant = engine
        .inventory
        .upsert_variant(&actor, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(variant))
}

pub async fn upsert_service(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<ServiceSpec>,
) -> ApiResult<HttpResponse> {
    let service = engine
        .bookings
        .upsert_service(&actor, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(service))
}
