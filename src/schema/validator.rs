//! Record validator
//!
//! Validation semantics:
//! - Every required field is present and non-null
//! - Optional fields may be absent or null
//! - Present values conform to the declared field type
//! - Keys not declared by the entity are accepted as-is
//! - All violations are collected; validation never stops at the first one
//!
//! Malformed type options (enum `values`, array `itemType`) skip the affected
//! sub-check with a warning instead of failing the record.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::coercion::{json_type_name, parse_date, parse_datetime, parse_reference};
use super::errors::{SchemaError, SchemaResult, ValidationFailure};
use super::types::{FieldDefinition, FieldType};

/// Validates record payloads against ordered field definitions.
///
/// Stateless; safe to call from any number of threads.
pub struct RecordValidator;

impl RecordValidator {
    /// Validates a payload and returns every violation found (empty = valid).
    pub fn validate(payload: &Map<String, Value>, fields: &[FieldDefinition]) -> Vec<String> {
        let mut violations = Vec::new();

        for field in fields {
            let key = field.field_key.as_str();

            match payload.get(key) {
                None => {
                    if field.required {
                        violations.push(format!("Required field '{}' is missing", key));
                    }
                }
                Some(Value::Null) => {
                    if field.required {
                        violations.push(format!("Required field '{}' cannot be null", key));
                    }
                }
                Some(value) => {
                    if let Some(violation) = Self::validate_field_value(field, value) {
                        violations.push(violation);
                    }
                }
            }
        }

        violations
    }

    /// Validates an untyped document. Fails only if the document is not a mapping.
    pub fn validate_document(
        document: &Value,
        fields: &[FieldDefinition],
    ) -> SchemaResult<Vec<String>> {
        let payload = document
            .as_object()
            .ok_or_else(|| SchemaError::malformed_payload(json_type_name(document)))?;
        Ok(Self::validate(payload, fields))
    }

    /// Validates a payload, turning a non-empty violation list into an error.
    pub fn validate_record(
        payload: &Map<String, Value>,
        fields: &[FieldDefinition],
    ) -> Result<(), ValidationFailure> {
        match ValidationFailure::from_violations(Self::validate(payload, fields)) {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    /// Validates one non-null value against its field definition.
    ///
    /// Returns the violation message, or `None` if the value conforms.
    pub fn validate_field_value(field: &FieldDefinition, value: &Value) -> Option<String> {
        let key = field.field_key.as_str();

        let Some(field_type) = field.kind() else {
            return Some(format!("Unknown field type for field '{}'", key));
        };

        match field_type {
            FieldType::String => {
                (!value.is_string()).then(|| format!("Field '{}' must be a string", key))
            }
            FieldType::Number => (!field_type.conforms(value))
                .then(|| format!("Field '{}' must be a number", key)),
            FieldType::Integer => (!field_type.conforms(value))
                .then(|| format!("Field '{}' must be an integer", key)),
            FieldType::Boolean => (!field_type.conforms(value))
                .then(|| format!("Field '{}' must be a boolean", key)),
            FieldType::Date => match value.as_str() {
                Some(s) if parse_date(s).is_some() => None,
                Some(_) => Some(format!("Field '{}' must be a valid date (YYYY-MM-DD)", key)),
                None => Some(format!("Field '{}' must be a valid date", key)),
            },
            FieldType::Datetime => match value.as_str() {
                Some(s) if parse_datetime(s).is_some() => None,
                Some(_) => Some(format!("Field '{}' must be a valid datetime (ISO format)", key)),
                None => Some(format!("Field '{}' must be a valid datetime", key)),
            },
            FieldType::Email => (!field_type.conforms(value))
                .then(|| format!("Field '{}' must be a valid email address", key)),
            FieldType::Url => (!field_type.conforms(value))
                .then(|| format!("Field '{}' must be a valid URL", key)),
            FieldType::Phone => (!field_type.conforms(value))
                .then(|| format!("Field '{}' must be a valid phone number", key)),
            FieldType::Enum => Self::validate_enum(field, value),
            FieldType::Object => {
                (!value.is_object()).then(|| format!("Field '{}' must be an object", key))
            }
            FieldType::Array => Self::validate_array(field, value),
            FieldType::Reference => match value.as_str() {
                Some(s) if parse_reference(s).is_some() => None,
                Some(_) => Some(format!("Field '{}' must be a valid UUID", key)),
                None => Some(format!("Field '{}' must be a valid reference ID", key)),
            },
        }
    }

    fn validate_enum(field: &FieldDefinition, value: &Value) -> Option<String> {
        let key = field.field_key.as_str();

        let Some(text) = value.as_str() else {
            return Some(format!("Field '{}' must be a string", key));
        };

        let Some(raw_values) = field.option("values") else {
            return None;
        };

        let Some(allowed) = string_list(raw_values) else {
            warn!(
                field = key,
                values = %raw_values,
                "Failed to validate enum field: options.values is not a list of strings"
            );
            return None;
        };

        if allowed.iter().any(|v| *v == text) {
            None
        } else {
            Some(format!("Field '{}' must be one of: {}", key, allowed.join(", ")))
        }
    }

    fn validate_array(field: &FieldDefinition, value: &Value) -> Option<String> {
        let key = field.field_key.as_str();

        let Some(items) = value.as_array() else {
            return Some(format!("Field '{}' must be an array", key));
        };

        let Some(raw_item_type) = field.option("itemType") else {
            return None;
        };

        let Some(item_type) = raw_item_type.as_str() else {
            warn!(
                field = key,
                item_type = %raw_item_type,
                "Failed to validate array items: options.itemType is not a string"
            );
            return None;
        };

        if FieldType::from_value(item_type).is_none() {
            debug!(field = key, item_type, "Skipping array item check for unknown item type");
            return None;
        }

        // First failing element wins, reported under its indexed key.
        items.iter().enumerate().find_map(|(i, item)| {
            let item_field =
                FieldDefinition::with_type_name(format!("{}[{}]", key, i), item_type);
            Self::validate_field_value(&item_field, item)
        })
    }
}

/// Reads a JSON list of strings, or `None` if the shape is anything else.
fn string_list(value: &Value) -> Option<Vec<&str>> {
    value
        .as_array()?
        .iter()
        .map(Value::as_str)
        .collect::<Option<Vec<_>>>()
}
