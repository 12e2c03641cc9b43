//! Schema config validation: identifiers, field uniqueness, default types.

use crate::config::SchemaConfig;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

/// Letters, digits and underscore, not starting with a digit.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(kind: &'static str, value: &str) -> Result<(), ConfigError> {
    if is_identifier(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        })
    }
}

pub fn validate(config: &SchemaConfig) -> Result<(), ConfigError> {
    if config.entity_name.trim().is_empty() {
        return Err(ConfigError::Validation("entity_name must not be empty".into()));
    }
    if config.path_segment.is_empty()
        || !config
            .path_segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::InvalidIdentifier {
            kind: "path_segment",
            value: config.path_segment.clone(),
        });
    }
    check_identifier("schema", &config.schema_name)?;
    check_identifier("table", &config.table_name)?;
    check_identifier("id field", &config.id_field)?;

    if config.fields.is_empty() {
        return Err(ConfigError::Validation("at least one field required".into()));
    }

    let mut names = HashSet::new();
    for f in &config.fields {
        check_identifier("field", &f.name)?;
        if f.name == config.id_field {
            return Err(ConfigError::Validation(format!(
                "field '{}' collides with the id field",
                f.name
            )));
        }
        if !names.insert(f.name.as_str()) {
            return Err(ConfigError::DuplicateField(f.name.clone()));
        }
        if let Some(default) = &f.default {
            if !default.is_null() && !f.type_.accepts(default) {
                return Err(ConfigError::Validation(format!(
                    "default for '{}' is not a valid {}",
                    f.name,
                    f.type_.as_str()
                )));
            }
        }
        if let Some(pattern) = &f.pattern {
            Regex::new(pattern)
                .map_err(|e| ConfigError::Validation(format!("invalid pattern for '{}': {}", f.name, e)))?;
        }
        if f.max_length == Some(0) {
            return Err(ConfigError::Validation(format!("max_length for '{}' must be positive", f.name)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin;
    use serde_json::json;

    #[test]
    fn builtin_schemas_are_valid() {
        for kind in ["books", "catalog", "students"] {
            validate(&builtin(kind).unwrap()).unwrap();
        }
    }

    #[test]
    fn rejects_duplicate_fields() {
        let mut cfg = builtin("books").unwrap();
        let dup = cfg.fields[0].clone();
        cfg.fields.push(dup);
        assert!(matches!(validate(&cfg), Err(ConfigError::DuplicateField(name)) if name == "title"));
    }

    #[test]
    fn rejects_field_named_like_id() {
        let mut cfg = builtin("books").unwrap();
        cfg.fields[0].name = "id".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_default_of_wrong_type() {
        let mut cfg = builtin("catalog").unwrap();
        let quantity = cfg.fields.iter_mut().find(|f| f.name == "quantity").unwrap();
        quantity.default = Some(json!("one"));
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_bad_identifiers() {
        let mut cfg = builtin("books").unwrap();
        cfg.table_name = "books; DROP TABLE x".into();
        assert!(matches!(
            validate(&cfg),
            Err(ConfigError::InvalidIdentifier { kind: "table", .. })
        ));
        assert!(!is_identifier("1abc"));
        assert!(is_identifier("_abc1"));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let mut cfg = builtin("students").unwrap();
        cfg.fields[0].pattern = Some("([".into());
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }
}
