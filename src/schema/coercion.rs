//! Field-type conformance and value canonicalization
//!
//! `conforms` answers "does this untyped value satisfy the declared type" and is
//! what the record validator uses. `coerce` produces the value used when a query
//! literal is compared against a typed field. Numeric and boolean text becomes a
//! JSON number or boolean; scalars become text for string fields. Every other
//! type keeps the literal unchanged once it conforms.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};
use uuid::Uuid;

use super::types::FieldType;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+_.-]+@(.+)$").expect("Invalid email regex"));

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?|ftp|file)://[-a-zA-Z0-9+&@#/%?=~_|!:,.;]*[-a-zA-Z0-9+&@#/%=~_|]$")
        .expect("Invalid url regex")
});

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\-\s]+$").expect("Invalid phone regex"));

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

impl FieldType {
    /// Returns true if `value` satisfies this type's conformance rule.
    ///
    /// Enum membership and array item types depend on field options and are
    /// checked by the validator on top of this.
    pub fn conforms(&self, value: &Value) -> bool {
        match self {
            FieldType::String | FieldType::Enum => value.is_string(),
            FieldType::Number => match value {
                Value::Number(_) => true,
                Value::String(s) => parse_decimal(s).is_some(),
                _ => false,
            },
            FieldType::Integer => match value {
                Value::Number(n) => n.is_i64(),
                Value::String(s) => parse_whole(s).is_some(),
                _ => false,
            },
            FieldType::Boolean => match value {
                Value::Bool(_) => true,
                Value::String(s) => parse_bool(s).is_some(),
                _ => false,
            },
            FieldType::Date => value.as_str().and_then(parse_date).is_some(),
            FieldType::Datetime => value.as_str().and_then(parse_datetime).is_some(),
            FieldType::Email => value.as_str().is_some_and(|s| EMAIL_PATTERN.is_match(s)),
            FieldType::Phone => value.as_str().is_some_and(|s| PHONE_PATTERN.is_match(s)),
            FieldType::Url => value.as_str().is_some_and(|s| URL_PATTERN.is_match(s)),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
            FieldType::Reference => value.as_str().and_then(parse_reference).is_some(),
        }
    }

    /// Canonicalizes `value` for comparison against a field of this type.
    ///
    /// Returns `None` when the value cannot take the type's shape.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self {
            FieldType::String => match value {
                Value::String(_) => Some(value.clone()),
                Value::Number(n) => Some(Value::String(n.to_string())),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                _ => None,
            },
            FieldType::Number => match value {
                Value::Number(_) => Some(value.clone()),
                Value::String(s) => parse_decimal(s),
                _ => None,
            },
            FieldType::Integer => match value {
                Value::Number(n) if n.is_i64() => Some(value.clone()),
                Value::String(s) => parse_whole(s).map(|i| Value::Number(i.into())),
                _ => None,
            },
            FieldType::Boolean => match value {
                Value::Bool(_) => Some(value.clone()),
                Value::String(s) => parse_bool(s).map(Value::Bool),
                _ => None,
            },
            // Dates, datetimes and references compare as written
            _ if self.conforms(value) => Some(value.clone()),
            _ => None,
        }
    }
}

/// Parses decimal text into a JSON number, preferring an integer representation.
pub fn parse_decimal(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Parses whole-number text.
pub fn parse_whole(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

/// Parses "true"/"false" in any case.
pub fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parses an ISO calendar date (YYYY-MM-DD).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parses an ISO-8601 date-time, with or without an offset.
///
/// Offsets are accepted but dropped: the result is the local wall-clock time.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Parses a reference id.
pub fn parse_reference(s: &str) -> Option<Uuid> {
    Uuid::parse_str(s).ok()
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_numeric_text() {
        assert!(FieldType::Number.conforms(&json!(3.5)));
        assert!(FieldType::Number.conforms(&json!("3.5")));
        assert!(FieldType::Number.conforms(&json!("-12")));
        assert!(!FieldType::Number.conforms(&json!("twelve")));
        assert!(!FieldType::Number.conforms(&json!(true)));
    }

    #[test]
    fn test_integer_rejects_fractions() {
        assert!(FieldType::Integer.conforms(&json!(42)));
        assert!(FieldType::Integer.conforms(&json!("42")));
        assert!(!FieldType::Integer.conforms(&json!(4.2)));
        assert!(!FieldType::Integer.conforms(&json!("4.2")));
    }

    #[test]
    fn test_boolean_text_is_case_insensitive() {
        assert!(FieldType::Boolean.conforms(&json!(false)));
        assert!(FieldType::Boolean.conforms(&json!("TRUE")));
        assert!(FieldType::Boolean.conforms(&json!("False")));
        assert!(!FieldType::Boolean.conforms(&json!("yes")));
        assert!(!FieldType::Boolean.conforms(&json!(1)));
    }

    #[test]
    fn test_dates() {
        assert!(FieldType::Date.conforms(&json!("2024-02-29")));
        assert!(!FieldType::Date.conforms(&json!("2023-02-29")));
        assert!(!FieldType::Date.conforms(&json!("29/02/2024")));

        assert!(FieldType::Datetime.conforms(&json!("2024-01-15T10:30:00")));
        assert!(FieldType::Datetime.conforms(&json!("2024-01-15T10:30:00.250")));
        assert!(FieldType::Datetime.conforms(&json!("2024-01-15T10:30:00Z")));
        assert!(FieldType::Datetime.conforms(&json!("2024-01-15T10:30:00+02:00")));
        assert!(!FieldType::Datetime.conforms(&json!("2024-01-15")));
    }

    #[test]
    fn test_text_shapes() {
        assert!(FieldType::Email.conforms(&json!("ann.lee+work@example.com")));
        assert!(!FieldType::Email.conforms(&json!("ann.example.com")));

        assert!(FieldType::Phone.conforms(&json!("+34 600-123-456")));
        assert!(!FieldType::Phone.conforms(&json!("call me")));

        assert!(FieldType::Url.conforms(&json!("https://example.com/a?b=c")));
        assert!(FieldType::Url.conforms(&json!("ftp://files.example.com/x")));
        assert!(!FieldType::Url.conforms(&json!("mailto:ann@example.com")));
        assert!(!FieldType::Url.conforms(&json!("https://example.com/ trailing")));
    }

    #[test]
    fn test_reference_requires_uuid() {
        assert!(FieldType::Reference.conforms(&json!("123e4567-e89b-12d3-a456-426614174000")));
        assert!(!FieldType::Reference.conforms(&json!("not-a-uuid")));
        assert!(!FieldType::Reference.conforms(&json!(7)));
    }

    #[test]
    fn test_coerce_types_numeric_and_boolean_text() {
        assert_eq!(FieldType::Integer.coerce(&json!("18")), Some(json!(18)));
        assert_eq!(FieldType::Number.coerce(&json!("2.5")), Some(json!(2.5)));
        assert_eq!(FieldType::Boolean.coerce(&json!("TRUE")), Some(json!(true)));
        assert_eq!(FieldType::String.coerce(&json!(18)), Some(json!("18")));
        assert_eq!(FieldType::Integer.coerce(&json!("abc")), None);
    }

    #[test]
    fn test_coerce_keeps_temporal_and_reference_text() {
        assert_eq!(
            FieldType::Datetime.coerce(&json!("2024-01-15T10:30:00Z")),
            Some(json!("2024-01-15T10:30:00Z"))
        );
        assert_eq!(
            FieldType::Datetime.coerce(&json!("2024-01-15T10:30:00.000")),
            Some(json!("2024-01-15T10:30:00.000"))
        );
        assert_eq!(
            FieldType::Reference.coerce(&json!("123E4567-E89B-12D3-A456-426614174000")),
            Some(json!("123E4567-E89B-12D3-A456-426614174000"))
        );
        assert_eq!(FieldType::Date.coerce(&json!("2024-02-29")), Some(json!("2024-02-29")));
        assert_eq!(FieldType::Datetime.coerce(&json!("soon")), None);
        assert_eq!(FieldType::Reference.coerce(&json!("nope")), None);
    }

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!(1)), "integer");
        assert_eq!(json_type_name(&json!(1.5)), "number");
        assert_eq!(json_type_name(&json!([])), "array");
    }
}
