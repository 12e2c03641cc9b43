//! Request validation against the entity schema.

use crate::config::{EntitySchema, FieldSpec};
use crate::error::AppError;
use crate::store::Record;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Creation payload: required fields are checked first, in declared order, and the
    /// first missing one fails the request on its own. Then every present field is checked.
    pub fn validate_create(schema: &EntitySchema, body: &Record) -> Result<(), AppError> {
        if let Some(f) = schema.first_missing_required(body) {
            return Err(AppError::Validation(format!("Missing required field: {}", f.name)));
        }
        for (f, v) in schema.changed_fields(body) {
            validate_field(f, v)?;
        }
        Ok(())
    }

    /// Update payload: any subset of fields, but not none, and required fields may not be nulled.
    pub fn validate_update(schema: &EntitySchema, body: &Record) -> Result<(), AppError> {
        if body.is_empty() {
            return Err(AppError::BadRequest("No data provided for update".into()));
        }
        for (f, v) in schema.changed_fields(body) {
            if f.required && v.is_null() {
                return Err(AppError::Validation(format!("Field '{}' cannot be null", f.name)));
            }
            validate_field(f, v)?;
        }
        Ok(())
    }
}

fn validate_field(f: &FieldSpec, v: &Value) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if !f.field_type.accepts(v) {
        return Err(AppError::Validation(format!(
            "Invalid value for field '{}': expected {}",
            f.name,
            f.field_type.as_str()
        )));
    }
    let Some(s) = v.as_str() else { return Ok(()) };
    if let Some(max) = f.max_length {
        if s.chars().count() > max as usize {
            return Err(AppError::Validation(format!(
                "Field '{}' must be at most {} characters",
                f.name, max
            )));
        }
    }
    if let Some(re) = &f.pattern {
        if !re.is_match(s) {
            return Err(AppError::Validation(format!(
                "Field '{}' does not match required pattern",
                f.name
            )));
        }
    }
    Ok(())
}
