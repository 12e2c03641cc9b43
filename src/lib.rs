//! Record API: schema-driven JSON CRUD over one entity collection.

pub mod app;
pub mod config;
pub mod error;
pub mod response;
pub mod sql;
pub mod state;
pub mod store;
pub mod service;
pub mod handlers;
pub mod routes;

pub use app::{build_app, build_state};
pub use config::{builtin, load_schema_file, resolve, EntitySchema, SchemaConfig, ServiceConfig, StoreBackend};
pub use error::{AppError, ConfigError};
pub use response::{error_body, success_many, success_one};
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgStore, Record, RecordId, RecordStore, StoreError};
pub use routes::{common_routes, entity_routes};
pub use service::CrudService;
