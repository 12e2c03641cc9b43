//! Load schema config from the built-in set or from a JSON file, and resolve it.

use crate::config::resolved::{EntitySchema, FieldSpec};
use crate::config::types::SchemaConfig;
use crate::config::validate;
use crate::error::ConfigError;
use crate::service::RequestValidator;
use regex::Regex;
use serde_json::json;
use std::path::Path;

/// Build resolved schema from config (validates first).
pub fn resolve(config: &SchemaConfig) -> Result<EntitySchema, ConfigError> {
    validate(config)?;

    let mut fields = Vec::with_capacity(config.fields.len());
    for f in &config.fields {
        let pattern = match &f.pattern {
            Some(p) => Some(
                Regex::new(p).map_err(|e| ConfigError::Validation(format!("invalid pattern for '{}': {}", f.name, e)))?,
            ),
            None => None,
        };
        fields.push(FieldSpec {
            name: f.name.clone(),
            field_type: f.type_,
            required: f.required,
            unique: f.unique,
            default: f.default.clone().filter(|v| !v.is_null()),
            max_length: f.max_length,
            pattern,
        });
    }

    let schema = EntitySchema {
        entity_name: config.entity_name.clone(),
        path_segment: config.path_segment.clone(),
        schema_name: config.schema_name.clone(),
        table_name: config.table_name.clone(),
        id_field: config.id_field.clone(),
        fields,
        seed: config.seed.clone(),
    };

    // Seed rows are held to the same rules as POST bodies.
    for (i, row) in schema.seed.iter().enumerate() {
        RequestValidator::validate_create(&schema, row)
            .map_err(|e| ConfigError::Validation(format!("seed row {}: {}", i, e)))?;
    }

    Ok(schema)
}

/// Read a `SchemaConfig` from a JSON file.
pub fn load_schema_file(path: impl AsRef<Path>) -> Result<SchemaConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

/// Built-in schemas: `books` (title/author/year), `catalog` (isbn-keyed library
/// catalogue), `students`.
pub fn builtin(kind: &str) -> Result<SchemaConfig, ConfigError> {
    let value = match kind {
        "books" => json!({
            "entity_name": "Book",
            "path_segment": "books",
            "table_name": "books",
            "fields": [
                { "name": "title", "type": "string", "required": true },
                { "name": "author", "type": "string", "required": true },
                { "name": "year", "type": "integer", "required": true }
            ],
            "seed": [
                { "title": "The Great Gatsby", "author": "F. Scott Fitzgerald", "year": 1925 },
                { "title": "1984", "author": "George Orwell", "year": 1949 }
            ]
        }),
        "catalog" => json!({
            "entity_name": "Book",
            "path_segment": "books",
            "table_name": "books",
            "id_field": "book_id",
            "fields": [
                { "name": "title", "type": "string", "required": true, "max_length": 255 },
                { "name": "author", "type": "string", "required": true, "max_length": 255 },
                { "name": "isbn", "type": "string", "required": true, "unique": true, "max_length": 20 },
                { "name": "genre", "type": "string", "max_length": 100 },
                { "name": "published_year", "type": "integer" },
                { "name": "quantity", "type": "integer", "default": 1 }
            ]
        }),
        "students" => json!({
            "entity_name": "Student",
            "path_segment": "students",
            "table_name": "students",
            "fields": [
                { "name": "student_number", "type": "string", "required": true, "unique": true, "max_length": 32 },
                { "name": "first_name", "type": "string", "required": true, "max_length": 100 },
                { "name": "middle_name", "type": "string", "max_length": 100 },
                { "name": "last_name", "type": "string", "required": true, "max_length": 100 },
                { "name": "sex", "type": "string", "required": true, "max_length": 16 },
                { "name": "birthday", "type": "date", "required": true }
            ]
        }),
        other => return Err(ConfigError::Load(format!("unknown entity schema '{}'", other))),
    };
    serde_json::from_value(value).map_err(|e| ConfigError::Load(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unknown_builtin_is_a_load_error() {
        assert!(matches!(builtin("magazines"), Err(ConfigError::Load(_))));
    }

    #[test]
    fn resolves_catalog_schema() {
        let schema = resolve(&builtin("catalog").unwrap()).unwrap();
        assert_eq!(schema.id_field, "book_id");
        assert_eq!(schema.not_found_message(), "Book not found");
        let unique: Vec<&str> = schema.unique_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(unique, vec!["isbn"]);
        assert_eq!(schema.field("isbn").unwrap().pg_type(), "varchar(20)");
        assert_eq!(schema.field("quantity").unwrap().default, Some(json!(1)));
    }

    #[test]
    fn books_builtin_carries_two_seed_rows() {
        let schema = resolve(&builtin("books").unwrap()).unwrap();
        assert_eq!(schema.seed.len(), 2);
        assert_eq!(schema.seed[1]["title"], json!("1984"));
    }

    #[test]
    fn loads_schema_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "entity_name": "Magazine",
                "path_segment": "magazines",
                "table_name": "magazines",
                "fields": [{{ "name": "name", "type": "string", "required": true }}]
            }}"#
        )
        .unwrap();
        let cfg = load_schema_file(file.path()).unwrap();
        let schema = resolve(&cfg).unwrap();
        assert_eq!(schema.path_segment, "magazines");
        assert_eq!(schema.not_found_message(), "Magazine not found");
    }

    #[test]
    fn rejects_seed_row_with_wrong_type() {
        let mut cfg = builtin("books").unwrap();
        cfg.seed.push(
            json!({ "title": "Dune", "author": "Herbert", "year": "abc" })
                .as_object()
                .cloned()
                .unwrap(),
        );
        let err = resolve(&cfg).unwrap_err();
        assert!(matches!(&err, ConfigError::Validation(m) if m.contains("seed row 2") && m.contains("'year'")), "{err}");
    }

    #[test]
    fn rejects_seed_row_over_max_length() {
        let mut cfg = builtin("catalog").unwrap();
        cfg.seed.push(
            json!({ "title": "Dune", "author": "Herbert", "isbn": "9".repeat(21) })
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert!(matches!(resolve(&cfg), Err(ConfigError::Validation(m)) if m.starts_with("seed row 0")));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        assert!(matches!(
            load_schema_file("/nonexistent/schema.json"),
            Err(ConfigError::Load(_))
        ));
    }
}
