//! Raw schema config types matching the JSON schema file format.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    /// Calendar date serialized as `YYYY-MM-DD`.
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Date => "date",
        }
    }

    /// Whether a non-null JSON value is acceptable for this type.
    pub fn accepts(&self, v: &Value) -> bool {
        match self {
            FieldType::String => v.is_string(),
            FieldType::Integer => v.is_i64(),
            FieldType::Date => v
                .as_str()
                .map(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Singular display name, used in messages ("Book not found").
    pub entity_name: String,
    pub path_segment: String,
    pub table_name: String,
    #[serde(default = "default_schema_name")]
    pub schema_name: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    pub fields: Vec<FieldConfig>,
    /// Sample rows inserted on startup when seeding is enabled.
    #[serde(default)]
    pub seed: Vec<Map<String, Value>>,
}

fn default_schema_name() -> String {
    "public".into()
}

fn default_id_field() -> String {
    "id".into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_with_defaults() {
        let cfg: SchemaConfig = serde_json::from_value(json!({
            "entity_name": "Book",
            "path_segment": "books",
            "table_name": "books",
            "fields": [
                { "name": "title", "type": "string", "required": true },
                { "name": "quantity", "type": "integer", "default": 1 }
            ]
        }))
        .unwrap();
        assert_eq!(cfg.schema_name, "public");
        assert_eq!(cfg.id_field, "id");
        assert!(cfg.seed.is_empty());
        assert!(cfg.fields[0].required);
        assert!(!cfg.fields[1].required);
        assert_eq!(cfg.fields[1].default, Some(json!(1)));
    }

    #[test]
    fn date_type_accepts_only_iso_dates() {
        assert!(FieldType::Date.accepts(&json!("2001-02-28")));
        assert!(!FieldType::Date.accepts(&json!("2001-02-30")));
        assert!(!FieldType::Date.accepts(&json!("28/02/2001")));
        assert!(!FieldType::Date.accepts(&json!(20010228)));
    }

    #[test]
    fn integer_type_rejects_floats_and_strings() {
        assert!(FieldType::Integer.accepts(&json!(1949)));
        assert!(!FieldType::Integer.accepts(&json!(19.5)));
        assert!(!FieldType::Integer.accepts(&json!("1949")));
    }
}
