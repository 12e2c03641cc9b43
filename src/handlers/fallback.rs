//! Envelopes for requests that never reach an entity handler.

use crate::error::{AppError, INTERNAL_SERVER_ERROR};
use crate::response::error_body;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::any::Any;

/// No route matched.
pub async fn not_found() -> AppError {
    AppError::RouteNotFound
}

/// Route matched but the method did not.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Response for a handler panic: logged with whatever payload it carried, never echoed.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error_body(INTERNAL_SERVER_ERROR))).into_response()
}
