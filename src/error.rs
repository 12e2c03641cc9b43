//! Typed errors and HTTP mapping.

use crate::response::ErrorBody;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

pub const RESOURCE_NOT_FOUND: &str = "Resource not found";
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {kind} identifier '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },
    #[error("duplicate field: {0}")]
    DuplicateField(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Request-level failures. The `Display` text of client-facing variants is sent verbatim
/// as the envelope's `error`; server-side variants are logged and replaced by a generic message.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Entity lookup miss; carries the entity-specific message ("Book not found").
    #[error("{0}")]
    NotFound(String),
    /// No route matched, or the path id is not a non-negative integer.
    #[error("Resource not found")]
    RouteNotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Validation(String),
    #[error("Duplicate value for unique field: {0}")]
    Uniqueness(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Validation(_) | AppError::Uniqueness(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        if self.status().is_server_error() {
            INTERNAL_SERVER_ERROR.to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(ErrorBody::new(self.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound("Book not found".into()), StatusCode::NOT_FOUND, "Book not found")]
    #[case(AppError::RouteNotFound, StatusCode::NOT_FOUND, "Resource not found")]
    #[case(
        AppError::Validation("Missing required field: author".into()),
        StatusCode::BAD_REQUEST,
        "Missing required field: author"
    )]
    #[case(
        AppError::Uniqueness("isbn".into()),
        StatusCode::BAD_REQUEST,
        "Duplicate value for unique field: isbn"
    )]
    #[case(AppError::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")]
    #[case(
        AppError::Internal("connection reset by peer".into()),
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error"
    )]
    #[case(
        AppError::Db(sqlx::Error::PoolTimedOut),
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error"
    )]
    fn maps_status_and_hides_internal_detail(#[case] err: AppError, #[case] status: StatusCode, #[case] message: &str) {
        assert_eq!(err.status(), status);
        assert_eq!(err.public_message(), message);
    }
}
