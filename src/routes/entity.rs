//! Entity CRUD routes for the active schema: /<path_segment> and /<path_segment>/:id.

use crate::handlers::entity::{create, delete as delete_handler, list, read, update};
use crate::handlers::fallback::method_not_allowed;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    let segment = state.service.schema().path_segment.clone();
    Router::new()
        .route(
            &format!("/{}", segment),
            get(list).post(create).fallback(method_not_allowed),
        )
        .route(
            &format!("/{}/:id", segment),
            get(read).put(update).delete(delete_handler).fallback(method_not_allowed),
        )
        .with_state(state)
}
