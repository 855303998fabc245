use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::api::errors::ApiResult;
use crate::domain::booking::{BookingStatus, NewBooking};
use crate::engine::Engine;
use crate::payment::PaymentMethod;

#[derive(Debug, Deserialize)]
pub struct PaymentBody {
    pub method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: BookingStatus,
}

pub async fn create_booking(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    body: web::Json<NewBooking>,
) -> ApiResult<HttpResponse> {
    let booking = engine.bookings.create_booking(actor.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created()
        .insert_header(("Location", format!("/bookings/{}", booking.id)))
        .json(booking))
}

pub async fn list_bookings(engine: web::Data<Engine>, CurrentUser(actor): CurrentUser) -> ApiResult<HttpResponse> {
    let bookings = engine.bookings.list_bookings(actor.user_id).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

pub async fn get_booking(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let booking = engine.bookings.get_booking(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn history(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let events = engine.bookings.history(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(events))
}

pub async fn cancel(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let booking = engine.bookings.cancel(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn pay(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<PaymentBody>,
) -> ApiResult<HttpResponse> {
    let booking = engine
        .bookings
        .process_payment(path.into_inner(), body.method, &actor)
        .await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn update_status(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<StatusBody>,
) -> ApiResult<HttpResponse> {
    let booking = engine
        .bookings
        .update_status(path.into_inner(), body.status, &actor)
        .await?;
    Ok(HttpResponse::Ok().json(booking))
}
