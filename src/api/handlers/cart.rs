use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::auth::CurrentUser;
use crate::api::errors::ApiResult;
use crate::domain::cart::AddCartItem;
use crate::engine::Engine;

#[derive(Debug, Deserialize)]
pub struct UpdateDates {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// Mutations answer with the refreshed cart so clients never re-derive indexes.

pub async fn get_cart(engine: web::Data<Engine>, CurrentUser(actor): CurrentUser) -> ApiResult<HttpResponse> {
    let cart = engine.carts.get_cart(actor.user_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

pub async fn add_item(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    body: web::Json<AddCartItem>,
) -> ApiResult<HttpResponse> {
    engine.carts.add_item(actor.user_id, body.into_inner()).await?;
    let cart = engine.carts.get_cart(actor.user_id).await?;
    Ok(HttpResponse::Created().json(cart))
}

pub async fn update_dates(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<usize>,
    body: web::Json<UpdateDates>,
) -> ApiResult<HttpResponse> {
    engine
        .carts
        .update_dates(actor.user_id, path.into_inner(), body.start_date, body.end_date)
        .await?;
    let cart = engine.carts.get_cart(actor.user_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

pub async fn remove_item(
    engine: web::Data<Engine>,
    CurrentUser(actor): CurrentUser,
    path: web::Path<usize>,
) -> ApiResult<HttpResponse> {
    engine.carts.remove_item(actor.user_id, path.into_inner()).await?;
    let cart = engine.carts.get_cart(actor.user_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

pub async fn clear(engine: web::Data<Engine>, CurrentUser(actor): CurrentUser) -> ApiResult<HttpResponse> {
    engine.carts.clear(actor.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
