//! Record store: one entity collection keyed by integer id, behind a common trait.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::config::EntitySchema;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// One entity instance: field name to value, id field included.
pub type Record = Map<String, Value>;

pub type RecordId = i64;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(RecordId),
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("duplicate value for unique field: {field}")]
    Uniqueness { field: String },
    #[error("store fault: {0}")]
    Fault(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Fault(e.to_string())
    }
}

/// Persistence for the records of a single schema. Mutations are serializable with
/// respect to each other: id allocation and uniqueness checks never race.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn schema(&self) -> &Arc<EntitySchema>;

    /// Every record, in insertion order.
    async fn list_all(&self) -> Result<Vec<Record>, StoreError>;

    async fn get(&self, id: RecordId) -> Result<Record, StoreError>;

    /// Allocate a fresh id, apply defaults, insert, and return the full record.
    async fn create(&self, fields: &Record) -> Result<Record, StoreError>;

    /// Overwrite the declared fields present in `partial`; the id is never changed.
    async fn update(&self, id: RecordId, partial: &Record) -> Result<Record, StoreError>;

    /// Remove the record and return it.
    async fn delete(&self, id: RecordId) -> Result<Record, StoreError>;

    /// Readiness check.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Value of `field` on `record`, used for uniqueness comparisons; null never collides.
pub(crate) fn unique_value<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !v.is_null())
}
