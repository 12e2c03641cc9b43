//! Builds parameterized INSERT, SELECT, UPDATE, DELETE and table DDL from the entity schema.

use crate::config::{EntitySchema, FieldSpec};
use crate::store::{Record, RecordId};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from validated schema config).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified_table(schema: &EntitySchema) -> String {
    format!("{}.{}", quoted(&schema.schema_name), quoted(&schema.table_name))
}

/// Name of the UNIQUE constraint guarding `field`; matches PostgreSQL's own default naming.
pub fn unique_constraint_name(schema: &EntitySchema, field: &str) -> String {
    format!("{}_{}_key", schema.table_name, field)
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a param and return its placeholder, cast to the column type.
    fn push_param(&mut self, v: Value, field: &FieldSpec) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), field.pg_type())
    }

    fn push_id(&mut self, id: RecordId) -> String {
        self.params.push(Value::from(id));
        format!("${}::bigint", self.params.len())
    }
}

/// SELECT list: id first, then declared fields in order.
fn select_column_list(schema: &EntitySchema) -> String {
    std::iter::once(quoted(&schema.id_field))
        .chain(schema.fields.iter().map(|f| quoted(&f.name)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT every row ordered by id (ids are monotonic, so this is insertion order).
pub fn select_list(schema: &EntitySchema) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {}",
        select_column_list(schema),
        qualified_table(schema),
        quoted(&schema.id_field)
    );
    q
}

pub fn select_by_id(schema: &EntitySchema, id: RecordId) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_id(id);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(schema),
        qualified_table(schema),
        quoted(&schema.id_field),
        ph
    );
    q
}

/// INSERT every declared field from `values` (defaults already applied); the id comes from the identity column.
pub fn insert(schema: &EntitySchema, values: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in &schema.fields {
        let val = values.get(&f.name).cloned().unwrap_or(Value::Null);
        placeholders.push(q.push_param(val, f));
        cols.push(quoted(&f.name));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        qualified_table(schema),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(schema)
    );
    q
}

/// UPDATE by id: SET only declared fields present in `partial`. With nothing to set,
/// falls back to a plain SELECT so the caller still gets the current row.
pub fn update(schema: &EntitySchema, id: RecordId, partial: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (f, v) in schema.changed_fields(partial) {
        let ph = q.push_param(v.clone(), f);
        sets.push(format!("{} = {}", quoted(&f.name), ph));
    }
    if sets.is_empty() {
        return select_by_id(schema, id);
    }
    let id_ph = q.push_id(id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        qualified_table(schema),
        sets.join(", "),
        quoted(&schema.id_field),
        id_ph,
        select_column_list(schema)
    );
    q
}

pub fn delete(schema: &EntitySchema, id: RecordId) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_id(id);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        qualified_table(schema),
        quoted(&schema.id_field),
        ph,
        select_column_list(schema)
    );
    q
}

pub fn create_schema(schema: &EntitySchema) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(&schema.schema_name))
}

/// CREATE TABLE IF NOT EXISTS with an identity primary key and named UNIQUE constraints.
pub fn create_table(schema: &EntitySchema) -> String {
    let mut defs = vec![format!(
        "{} BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY",
        quoted(&schema.id_field)
    )];
    for f in &schema.fields {
        let mut def = format!("{} {}", quoted(&f.name), f.pg_type().to_uppercase());
        if f.required {
            def.push_str(" NOT NULL");
        }
        if let Some(d) = &f.default {
            def.push_str(" DEFAULT ");
            def.push_str(&default_literal(d));
        }
        defs.push(def);
    }
    for f in schema.unique_fields() {
        defs.push(format!(
            "CONSTRAINT {} UNIQUE ({})",
            quoted(&unique_constraint_name(schema, &f.name)),
            quoted(&f.name)
        ));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        qualified_table(schema),
        defs.join(",\n  ")
    )
}

fn default_literal(v: &Value) -> String {
    match v {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin, resolve};
    use serde_json::json;

    fn catalog() -> EntitySchema {
        resolve(&builtin("catalog").unwrap()).unwrap()
    }

    #[test]
    fn select_list_orders_by_id() {
        let q = select_list(&catalog());
        assert_eq!(
            q.sql,
            r#"SELECT "book_id", "title", "author", "isbn", "genre", "published_year", "quantity" FROM "public"."books" ORDER BY "book_id""#
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn insert_binds_every_declared_field() {
        let schema = catalog();
        let values = schema.creation_values(
            json!({ "title": "Dune", "author": "Herbert", "isbn": "1" }).as_object().unwrap(),
        );
        let q = insert(&schema, &values);
        assert!(q.sql.starts_with(
            r#"INSERT INTO "public"."books" ("title", "author", "isbn", "genre", "published_year", "quantity") VALUES ($1::varchar(255), $2::varchar(255), $3::varchar(20), $4::varchar(100), $5::bigint, $6::bigint) RETURNING "book_id""#
        ));
        assert_eq!(q.params.len(), 6);
        assert_eq!(q.params[5], json!(1));
    }

    #[test]
    fn update_sets_only_present_fields_and_skips_id() {
        let schema = catalog();
        let partial = json!({ "quantity": 3, "book_id": 9, "nope": 1 });
        let q = update(&schema, 4, partial.as_object().unwrap());
        assert_eq!(
            q.sql,
            r#"UPDATE "public"."books" SET "quantity" = $1::bigint WHERE "book_id" = $2::bigint RETURNING "book_id", "title", "author", "isbn", "genre", "published_year", "quantity""#
        );
        assert_eq!(q.params, vec![json!(3), json!(4)]);
    }

    #[test]
    fn empty_update_falls_back_to_select() {
        let schema = catalog();
        let q = update(&schema, 4, &Record::new());
        assert!(q.sql.starts_with("SELECT "));
        assert_eq!(q.params, vec![json!(4)]);
    }

    #[test]
    fn delete_returns_removed_row() {
        let q = delete(&catalog(), 2);
        assert!(q.sql.starts_with(r#"DELETE FROM "public"."books" WHERE "book_id" = $1::bigint RETURNING"#));
    }

    #[test]
    fn create_table_declares_identity_and_unique_constraint() {
        let ddl = create_table(&catalog());
        assert!(ddl.contains(r#""book_id" BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY"#));
        assert!(ddl.contains(r#""title" VARCHAR(255) NOT NULL"#));
        assert!(ddl.contains(r#""quantity" BIGINT DEFAULT 1"#));
        assert!(ddl.contains(r#"CONSTRAINT "books_isbn_key" UNIQUE ("isbn")"#));
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quoted(r#"a"b"#), r#""a""b""#);
    }
}
