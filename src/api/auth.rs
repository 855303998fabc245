use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use super::errors::ApiError;
use crate::actor::{Actor, Role};

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Identity asserted by the upstream session layer.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Actor);

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(actor_from_request(req).map(CurrentUser))
    }
}

fn actor_from_request(req: &HttpRequest) -> Result<Actor, ApiError> {
    let headers = req.headers();

    let user_id = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {} header", USER_ID_HEADER)))?
        .to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or_else(|| ApiError::Unauthenticated(format!("{} must be a UUID", USER_ID_HEADER)))?;

    let role = match headers.get(USER_ROLE_HEADER).map(|value| value.to_str()) {
        None => Role::Customer,
        Some(Ok(value)) if value.eq_ignore_ascii_case("customer") => Role::Customer,
        Some(Ok(value)) if value.eq_ignore_ascii_case("admin") => Role::Admin,
        Some(_) => {
            return Err(ApiError::Unauthenticated(format!(
                "{} must be customer or admin",
                USER_ROLE_HEADER
            )))
        }
    };

    Ok(Actor { user_id, role })
}
