// ============================================================================
// HTTP API - actix-web routes over the engine
// ============================================================================
//
// Identity arrives in `X-User-Id` / `X-User-Role` headers. Handlers stay
// thin: decode, call one engine operation, encode. Every failure funnels
// through `ApiError` so the status mapping lives in one place.
//
// ============================================================================

pub mod auth;
pub mod errors;
pub mod handlers;

use actix_web::{error::JsonPayloadError, error::PathError, error::QueryPayloadError, web, HttpRequest};

use self::errors::ApiError;
use self::handlers::{bookings, cart, inventory, ops, orders};

pub use auth::{CurrentUser, USER_ID_HEADER, USER_ROLE_HEADER};
pub use errors::ApiResult;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}

/// Mounts every route. Callers add `web::Data<Engine>` themselves.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .route("/metrics", web::get().to(ops::metrics))
        .route("/health", web::get().to(ops::health))
        .service(
            web::scope("/variants")
                .route("/{id}", web::get().to(inventory::get_variant))
                .route("/{id}/availability", web::get().to(inventory::get_availability)),
        )
        .service(
            web::scope("/admin")
                .route("/variants/{id}", web::put().to(inventory::upsert_variant))
                .route("/services/{id}", web::put().to(inventory::upsert_service)),
        )
        .service(
            web::scope("/cart")
                .route("", web::get().to(cart::get_cart))
                .route("", web::delete().to(cart::clear))
                .route("/items", web::post().to(cart::add_item))
                .route("/items/{index}", web::patch().to(cart::update_dates))
                .route("/items/{index}", web::delete().to(cart::remove_item)),
        )
        .service(
            web::scope("/orders")
                .route("", web::post().to(orders::create_order))
                .route("", web::get().to(orders::list_orders))
                .route("/{id}", web::get().to(orders::get_order))
                .route("/{id}/history", web::get().to(orders::history))
                .route("/{id}/cancel", web::post().to(orders::cancel))
                .route("/{id}/payment", web::post().to(orders::pay))
                .route("/{id}/status", web::put().to(orders::update_status)),
        )
        .service(
            web::scope("/bookings")
                .route("", web::post().to(bookings::create_booking))
                .route("", web::get().to(bookings::list_bookings))
                .route("/{id}", web::get().to(bookings::get_booking))
                .route("/{id}/history", web::get().to(bookings::history))
                .route("/{id}/cancel", web::post().to(bookings::cancel))
                .route("/{id}/payment", web::post().to(bookings::pay))
                .route("/{id}/status", web::put().to(bookings::update_status)),
        );
}
