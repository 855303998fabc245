use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::error::EngineError;

/// Error surface of the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// No usable identity on the request.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Body, path or query could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
    retryable: bool,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Engine(err) => err.code(),
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Engine(err) => match err {
                EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
                EngineError::InvalidRange(_) | EngineError::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
                EngineError::OutOfStock { .. }
                | EngineError::InsufficientStock { .. }
                | EngineError::InvalidTransition { .. }
                | EngineError::SlotConflict { .. } => StatusCode::CONFLICT,
                EngineError::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
                EngineError::Unauthorized(_) => StatusCode::FORBIDDEN,
                EngineError::Storage(_) | EngineError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "internal error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorBody {
            error: self.code(),
            message,
            retryable: matches!(self, ApiError::Engine(err) if err.is_retryable()),
        })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
