//! Virtual entity schemas
//!
//! Entities are caller-defined record types: a name plus an ordered list of
//! typed fields. Records are validated against them before any write.
//!
//! # Rules
//!
//! - Required fields must be present and non-null
//! - Optional fields may be absent or null
//! - Unknown payload keys are accepted
//! - Every violation is reported, not just the first
//! - Malformed enum/array options skip the sub-check instead of failing

mod coercion;
mod errors;
mod loader;
mod types;
mod validator;

pub use coercion::{
    json_type_name, parse_bool, parse_date, parse_datetime, parse_decimal, parse_reference,
    parse_whole,
};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity, ValidationFailure};
pub use loader::{SchemaLoader, SchemaLookup};
pub use types::{EntityDefinition, FieldDefinition, FieldType};
pub use validator::RecordValidator;
