//! Generic CRUD over a record store, with validation and store-error translation.

use crate::config::EntitySchema;
use crate::error::AppError;
use crate::service::RequestValidator;
use crate::store::{Record, RecordId, RecordStore, StoreError};
use std::sync::Arc;

#[derive(Clone)]
pub struct CrudService {
    store: Arc<dyn RecordStore>,
}

impl CrudService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        CrudService { store }
    }

    pub fn schema(&self) -> &EntitySchema {
        self.store.schema()
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub async fn list(&self) -> Result<Vec<Record>, AppError> {
        self.store.list_all().await.map_err(|e| self.translate(e))
    }

    pub async fn read(&self, id: RecordId) -> Result<Record, AppError> {
        self.store.get(id).await.map_err(|e| self.translate(e))
    }

    /// Validate (fail-fast on required fields) and insert. Nothing reaches the store on a validation failure.
    pub async fn create(&self, body: &Record) -> Result<Record, AppError> {
        RequestValidator::validate_create(self.schema(), body)?;
        let row = self.store.create(body).await.map_err(|e| self.translate(e))?;
        tracing::info!(entity = %self.schema().entity_name, id = ?row.get(&self.schema().id_field), "record created");
        Ok(row)
    }

    /// Lookup first: a missing record is reported before anything about the payload,
    /// including a body that could not be parsed.
    pub async fn update(&self, id: RecordId, body: Result<Record, AppError>) -> Result<Record, AppError> {
        self.read(id).await?;
        let body = body?;
        RequestValidator::validate_update(self.schema(), &body)?;
        self.store.update(id, &body).await.map_err(|e| self.translate(e))
    }

    pub async fn delete(&self, id: RecordId) -> Result<Record, AppError> {
        let row = self.store.delete(id).await.map_err(|e| self.translate(e))?;
        tracing::info!(entity = %self.schema().entity_name, id, "record deleted");
        Ok(row)
    }

    fn translate(&self, e: StoreError) -> AppError {
        match e {
            StoreError::NotFound(_) => AppError::NotFound(self.schema().not_found_message()),
            StoreError::MissingField(name) => AppError::Validation(format!("Missing required field: {}", name)),
            StoreError::Uniqueness { field } => AppError::Uniqueness(field),
            StoreError::Fault(msg) => AppError::Internal(msg),
        }
    }
}
