//! PostgreSQL-backed store: one table per entity, identity id column, named unique constraints.

use crate::config::{EntitySchema, FieldType};
use crate::sql::{self, PgBindValue, QueryBuf};
use crate::store::{Record, RecordId, RecordStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::ConnectOptions;
use std::str::FromStr;
use std::sync::Arc;

pub struct PgStore {
    pool: PgPool,
    schema: Arc<EntitySchema>,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: Arc<EntitySchema>) -> Self {
        PgStore { pool, schema }
    }

    /// Create the schema and table if they do not exist. Existing tables are left as they are.
    pub async fn ensure_table(&self) -> Result<(), StoreError> {
        sqlx::query(&sql::create_schema(&self.schema))
            .execute(&self.pool)
            .await?;
        let ddl = sql::create_table(&self.schema);
        tracing::debug!(sql = %ddl, "ensure table");
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert `rows` only when the table is empty. Returns how many rows were inserted.
    pub async fn seed_if_empty(&self, rows: &[Record]) -> Result<usize, StoreError> {
        if rows.is_empty() || !self.list_all().await?.is_empty() {
            return Ok(0);
        }
        for row in rows {
            self.create(row).await?;
        }
        tracing::info!(count = rows.len(), table = %self.schema.table_name, "seeded table");
        Ok(rows.len())
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.map_db_error(e))?;
        Ok(row.map(|r| self.row_to_record(&r)))
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await.map_err(|e| self.map_db_error(e))?;
        Ok(rows.iter().map(|r| self.row_to_record(r)).collect())
    }

    /// Unique violations (SQLSTATE 23505) name the field through the constraint; everything else is a fault.
    fn map_db_error(&self, e: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                let constraint = db.constraint().unwrap_or_default();
                let field = self
                    .schema
                    .unique_fields()
                    .find(|f| sql::unique_constraint_name(&self.schema, &f.name) == constraint)
                    .map(|f| f.name.clone())
                    .unwrap_or_else(|| constraint.to_string());
                return StoreError::Uniqueness { field };
            }
        }
        StoreError::from(e)
    }

    fn row_to_record(&self, row: &PgRow) -> Record {
        let mut map = Record::new();
        map.insert(
            self.schema.id_field.clone(),
            cell_to_value(row, &self.schema.id_field, FieldType::Integer),
        );
        for f in &self.schema.fields {
            map.insert(f.name.clone(), cell_to_value(row, &f.name, f.field_type));
        }
        map
    }
}

fn cell_to_value(row: &PgRow, name: &str, field_type: FieldType) -> Value {
    use sqlx::Row;
    match field_type {
        FieldType::Integer => {
            if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
                return Value::from(n);
            }
            if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
                return Value::from(n);
            }
        }
        FieldType::Date => {
            if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
                return Value::String(d.format("%Y-%m-%d").to_string());
            }
        }
        FieldType::String => {
            if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
                return Value::String(s);
            }
        }
    }
    Value::Null
}

#[async_trait]
impl RecordStore for PgStore {
    fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    async fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        self.fetch_all(&sql::select_list(&self.schema)).await
    }

    async fn get(&self, id: RecordId) -> Result<Record, StoreError> {
        self.fetch_optional(&sql::select_by_id(&self.schema, id))
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, fields: &Record) -> Result<Record, StoreError> {
        if let Some(f) = self.schema.first_missing_required(fields) {
            return Err(StoreError::MissingField(f.name.clone()));
        }
        let values = self.schema.creation_values(fields);
        self.fetch_optional(&sql::insert(&self.schema, &values))
            .await?
            .ok_or_else(|| StoreError::Fault("insert returned no row".into()))
    }

    async fn update(&self, id: RecordId, partial: &Record) -> Result<Record, StoreError> {
        if let Some((f, _)) = self
            .schema
            .changed_fields(partial)
            .find(|(f, v)| f.required && v.is_null())
        {
            return Err(StoreError::MissingField(f.name.clone()));
        }
        self.fetch_optional(&sql::update(&self.schema, id, partial))
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn delete(&self, id: RecordId) -> Result<Record, StoreError> {
        self.fetch_optional(&sql::delete(&self.schema, id))
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Create the database named in `database_url` if it does not exist (connects to `postgres` to check).
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| StoreError::Fault(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", sql::quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), StoreError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| StoreError::Fault("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}
