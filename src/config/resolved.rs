//! Resolved entity schema: config validated and flattened for runtime use.

use crate::config::FieldType;
use crate::store::{Record, RecordId};
use regex::Regex;
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub unique: bool,
    pub default: Option<Value>,
    pub max_length: Option<u32>,
    pub pattern: Option<Regex>,
}

impl FieldSpec {
    /// PostgreSQL type used for DDL and placeholder casts.
    pub fn pg_type(&self) -> String {
        match (self.field_type, self.max_length) {
            (FieldType::String, Some(n)) => format!("varchar({})", n),
            (FieldType::String, None) => "text".into(),
            (FieldType::Integer, _) => "bigint".into(),
            (FieldType::Date, _) => "date".into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EntitySchema {
    pub entity_name: String,
    pub path_segment: String,
    pub schema_name: String,
    pub table_name: String,
    pub id_field: String,
    /// Declared order; validation and record layout follow it.
    pub fields: Vec<FieldSpec>,
    pub seed: Vec<Record>,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.unique)
    }

    pub fn not_found_message(&self) -> String {
        format!("{} not found", self.entity_name)
    }

    pub fn deleted_message(&self) -> String {
        format!("{} deleted successfully", self.entity_name)
    }

    /// First required field, in declared order, that is absent or null.
    pub fn first_missing_required(&self, fields: &Record) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .find(|f| fields.get(&f.name).map_or(true, Value::is_null))
    }

    /// Declared fields only, with defaults applied to unset optional fields.
    /// The id field is never taken from `fields`.
    pub fn creation_values(&self, fields: &Record) -> Record {
        let mut out = Record::new();
        for f in &self.fields {
            let v = match fields.get(&f.name) {
                Some(v) if !v.is_null() => v.clone(),
                _ => f.default.clone().unwrap_or(Value::Null),
            };
            out.insert(f.name.clone(), v);
        }
        out
    }

    /// Full record: id first, then declared fields in order.
    pub fn build_record(&self, id: RecordId, fields: &Record) -> Record {
        let mut out = Record::new();
        out.insert(self.id_field.clone(), Value::from(id));
        out.extend(self.creation_values(fields));
        out
    }

    /// Apply a partial update: each declared field present in `partial` overwrites
    /// the record's value; everything else is left as it was.
    pub fn merge(&self, record: &mut Record, partial: &Record) {
        for f in &self.fields {
            if let Some(v) = partial.get(&f.name) {
                record.insert(f.name.clone(), v.clone());
            }
        }
    }

    /// Declared fields present in `partial`, in declared order.
    pub fn changed_fields<'a>(&'a self, partial: &'a Record) -> impl Iterator<Item = (&'a FieldSpec, &'a Value)> {
        self.fields
            .iter()
            .filter_map(move |f| partial.get(&f.name).map(|v| (f, v)))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{builtin, resolve};
    use crate::store::Record;
    use serde_json::{json, Value};

    fn obj(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn build_record_applies_defaults_and_ignores_unknown_and_id() {
        let schema = resolve(&builtin("catalog").unwrap()).unwrap();
        let rec = schema.build_record(
            7,
            &obj(json!({ "book_id": 99, "title": "Dune", "author": "Herbert", "isbn": "x1", "extra": true })),
        );
        assert_eq!(rec["book_id"], json!(7));
        assert_eq!(rec["quantity"], json!(1));
        assert_eq!(rec["genre"], Value::Null);
        assert!(rec.get("extra").is_none());
        let keys: Vec<&str> = rec.keys().map(String::as_str).collect();
        assert_eq!(keys[0], "book_id");
    }

    #[test]
    fn merge_only_touches_named_fields() {
        let schema = resolve(&builtin("books").unwrap()).unwrap();
        let mut rec = schema.build_record(1, &obj(json!({ "title": "1984", "author": "Orwell", "year": 1949 })));
        let before = rec.clone();
        schema.merge(&mut rec, &obj(json!({ "id": 500, "year": 2000, "colour": "red" })));
        assert_eq!(rec["id"], json!(1));
        assert_eq!(rec["year"], json!(2000));
        assert_eq!(rec["title"], before["title"]);
        assert_eq!(rec["author"], before["author"]);
        assert!(rec.get("colour").is_none());
    }

    #[test]
    fn merge_with_empty_partial_is_noop() {
        let schema = resolve(&builtin("students").unwrap()).unwrap();
        let mut rec = schema.build_record(
            3,
            &obj(json!({
                "student_number": "S-1", "first_name": "Ana", "last_name": "Cruz",
                "sex": "F", "birthday": "2001-05-04"
            })),
        );
        let before = rec.clone();
        schema.merge(&mut rec, &Record::new());
        assert_eq!(rec, before);
    }

    #[test]
    fn first_missing_required_follows_declared_order_and_treats_null_as_missing() {
        let schema = resolve(&builtin("books").unwrap()).unwrap();
        let missing = schema.first_missing_required(&obj(json!({ "title": "X", "author": null })));
        assert_eq!(missing.map(|f| f.name.as_str()), Some("author"));
        assert!(schema
            .first_missing_required(&obj(json!({ "title": "X", "author": "Y", "year": 1 })))
            .is_none());
    }
}
