//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{BidParseError, DomainError, FALLBACK_MESSAGE, ValidationError};
use thiserror::Error;

const UNAUTHORIZED_MESSAGE: &str = "Admin token required";

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or wrong admin token.
    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized,

    /// The caller may not do this right now.
    #[error("{0}")]
    Forbidden(String),

    /// Domain logic error.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_MESSAGE.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Validation(validation) => {
            let status = match validation {
                ValidationError::UnknownBidder(_) => StatusCode::NOT_FOUND,
                ValidationError::InvalidPhase(_) => StatusCode::BAD_REQUEST,
                ValidationError::DuplicateBidder(_) | ValidationError::RegistrationClosed(_) => {
                    StatusCode::CONFLICT
                }
            };
            (status, err.user_message())
        }
        _ => {
            tracing::error!(error = %err, "domain operation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.user_message())
        }
    }
}

impl From<BidParseError> for ApiError {
    fn from(err: BidParseError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
