//! Application assembly: store construction from settings, router, middleware.

use crate::config::{resolve, ServiceConfig, StoreBackend};
use crate::error::AppError;
use crate::handlers::fallback::{not_found, panic_response};
use crate::routes::{common_routes, entity_routes};
use crate::service::CrudService;
use crate::state::AppState;
use crate::store::{ensure_database_exists, MemoryStore, PgStore, Record, RecordStore, StoreError};
use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Resolve the active schema and open its store (creating the table for PostgreSQL).
pub async fn build_state(config: &ServiceConfig) -> Result<AppState, AppError> {
    let schema = Arc::new(resolve(&config.schema_config()?)?);
    let seed: &[Record] = if config.seed_sample_data { &schema.seed } else { &[] };

    let store: Arc<dyn RecordStore> = match config.backend {
        StoreBackend::Memory => Arc::new(
            MemoryStore::with_seed(Arc::clone(&schema), seed)
                .await
                .map_err(store_setup_error)?,
        ),
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| AppError::Internal("DATABASE_URL not set".into()))?;
            ensure_database_exists(url).await.map_err(store_setup_error)?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await?;
            let store = PgStore::new(pool, Arc::clone(&schema));
            store.ensure_table().await.map_err(store_setup_error)?;
            store.seed_if_empty(seed).await.map_err(store_setup_error)?;
            Arc::new(store)
        }
    };

    tracing::info!(
        entity = %schema.entity_name,
        path = %schema.path_segment,
        backend = ?config.backend,
        "store ready"
    );
    Ok(AppState::new(CrudService::new(store)))
}

fn store_setup_error(e: StoreError) -> AppError {
    AppError::Internal(format!("store setup: {}", e))
}

/// Full router: /api/<entity> CRUD, common routes, JSON 404 fallback, panic and body-size guards.
pub fn build_app(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", entity_routes(state))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_body_bytes))
}
