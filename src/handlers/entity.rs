//! Entity CRUD handlers: list, create, read, update, delete.

use crate::error::AppError;
use crate::response::{success_many, success_message, success_one, success_one_ok};
use crate::state::AppState;
use crate::store::{Record, RecordId};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

/// Path ids are non-negative integers; anything else does not match the route.
fn parse_id(id_str: &str) -> Result<RecordId, AppError> {
    if id_str.is_empty() || !id_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::RouteNotFound);
    }
    id_str.parse::<RecordId>().map_err(|_| AppError::RouteNotFound)
}

fn body_to_map(payload: Result<Json<Value>, JsonRejection>) -> Result<Record, AppError> {
    match payload {
        Ok(Json(Value::Object(m))) => Ok(m),
        Ok(_) => Err(AppError::BadRequest("Request body must be a JSON object".into())),
        Err(JsonRejection::MissingJsonContentType(_)) => {
            Err(AppError::BadRequest("Content-type must be application/json".into()))
        }
        // Over DefaultBodyLimit, whether declared by Content-Length or found while streaming.
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => Err(AppError::PayloadTooLarge),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable json body");
            Err(AppError::BadRequest("Request body must be valid JSON".into()))
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Result<impl axum::response::IntoResponse, AppError> {
    let rows = state.service.list().await?;
    Ok(success_many(rows))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let body = body_to_map(payload)?;
    let row = state.service.create(&body).await?;
    Ok(success_one(row))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let row = state.service.read(id).await?;
    Ok(success_one_ok(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let row = state.service.update(id, body_to_map(payload)).await?;
    Ok(success_one_ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let row = state.service.delete(id).await?;
    Ok(success_message(state.service.schema().deleted_message(), row))
}
