use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::api::errors::ApiResult;
use crate::domain::order::OrderStatus;
use crate::engine::Engine;
use crate::payment::PaymentMethod;

#[derive(Debug, Deserialize)]
pub struct PaymentBody {
    pub method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: OrderStatus,
}

pub async fn create_order(engine: web::Data<Engine>, CurrentUser(actor): CurrentUser) -> ApiResult<HttpResponse> {
    let order = engine.orders.create_order(actor.user_id).await?;
    Ok(HttpResponse::Created()
        .insert_header(("Location", format!("/orders/{}", order.id)))
        .json(order))
}

pub async fn list_orders(engine: web::Data<Engine>, CurrentUser(actor): CurrentUser) -> ApiResult<HttpResponse> {
    let orders = engine.orders.list_orders(actor.user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn get_order(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let order = engine.orders.get_order(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn history(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let events = engine.orders.history(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(events))
}

pub async fn cancel(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let order = engine.orders.cancel(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn pay(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<PaymentBody>,
) -> ApiResult<HttpResponse> {
    let order = engine
        .orders
        .process_payment(path.into_inner(), body.method, &actor)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn update_status(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<StatusBody>,
) -> ApiResult<HttpResponse> {
    let order = engine
        .orders
        .update_status(path.into_inner(), body.status, &actor)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}
