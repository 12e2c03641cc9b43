//! Process-local store: records kept in insertion order behind one mutex.

use crate::config::EntitySchema;
use crate::store::{unique_value, Record, RecordId, RecordStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    records: Vec<Record>,
    /// Highest id ever issued; deleted ids are never handed out again.
    last_issued: RecordId,
}

impl Inner {
    fn position(&self, id_field: &str, id: RecordId) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.get(id_field).and_then(Value::as_i64) == Some(id))
    }

    /// First unique field of `candidate` whose value is already held by another record.
    fn collision(&self, schema: &EntitySchema, candidate: &Record, skip: Option<usize>) -> Option<String> {
        for f in schema.unique_fields() {
            let Some(v) = unique_value(candidate, &f.name) else { continue };
            let taken = self
                .records
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != skip)
                .any(|(_, r)| unique_value(r, &f.name) == Some(v));
            if taken {
                return Some(f.name.clone());
            }
        }
        None
    }
}

pub struct MemoryStore {
    schema: Arc<EntitySchema>,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        MemoryStore {
            schema,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// New store pre-populated with `rows`, inserted through `create`.
    pub async fn with_seed(schema: Arc<EntitySchema>, rows: &[Record]) -> Result<Self, StoreError> {
        let store = Self::new(schema);
        for row in rows {
            store.create(row).await?;
        }
        tracing::debug!(count = rows.len(), entity = %store.schema.entity_name, "seeded memory store");
        Ok(store)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        Ok(self.inner.lock().await.records.clone())
    }

    async fn get(&self, id: RecordId) -> Result<Record, StoreError> {
        let inner = self.inner.lock().await;
        let pos = inner.position(&self.schema.id_field, id).ok_or(StoreError::NotFound(id))?;
        Ok(inner.records[pos].clone())
    }

    async fn create(&self, fields: &Record) -> Result<Record, StoreError> {
        if let Some(f) = self.schema.first_missing_required(fields) {
            return Err(StoreError::MissingField(f.name.clone()));
        }
        let mut inner = self.inner.lock().await;
        let id = inner.last_issued + 1;
        let record = self.schema.build_record(id, fields);
        if let Some(field) = inner.collision(&self.schema, &record, None) {
            return Err(StoreError::Uniqueness { field });
        }
        inner.last_issued = id;
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: RecordId, partial: &Record) -> Result<Record, StoreError> {
        let mut inner = self.inner.lock().await;
        let pos = inner.position(&self.schema.id_field, id).ok_or(StoreError::NotFound(id))?;
        let mut updated = inner.records[pos].clone();
        self.schema.merge(&mut updated, partial);
        if let Some(f) = self.schema.first_missing_required(&updated) {
            return Err(StoreError::MissingField(f.name.clone()));
        }
        if let Some(field) = inner.collision(&self.schema, &updated, Some(pos)) {
            return Err(StoreError::Uniqueness { field });
        }
        inner.records[pos] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: RecordId) -> Result<Record, StoreError> {
        let mut inner = self.inner.lock().await;
        let pos = inner.position(&self.schema.id_field, id).ok_or(StoreError::NotFound(id))?;
        Ok(inner.records.remove(pos))
    }
}
