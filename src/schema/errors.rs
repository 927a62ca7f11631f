//! Schema error types
//!
//! Error codes:
//! - MODELHUB_VALIDATION_FAILED (REJECT)
//! - MODELHUB_MALFORMED_PAYLOAD (REJECT)
//! - MODELHUB_UNKNOWN_ENTITY (REJECT)
//! - MODELHUB_DUPLICATE_ENTITY (REJECT)
//! - MODELHUB_MALFORMED_DEFINITION (FATAL when loading from disk)

use std::fmt;

use uuid::Uuid;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
    /// Definition store is unusable
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Payload violates the entity's field definitions
    ValidationFailed,
    /// Payload is not a key-value mapping
    MalformedPayload,
    /// Entity id or name not found
    UnknownEntity,
    /// Entity id already registered
    DuplicateEntity,
    /// Entity definition file unreadable or structurally invalid
    MalformedDefinition,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::ValidationFailed => "MODELHUB_VALIDATION_FAILED",
            SchemaErrorCode::MalformedPayload => "MODELHUB_MALFORMED_PAYLOAD",
            SchemaErrorCode::UnknownEntity => "MODELHUB_UNKNOWN_ENTITY",
            SchemaErrorCode::DuplicateEntity => "MODELHUB_DUPLICATE_ENTITY",
            SchemaErrorCode::MalformedDefinition => "MODELHUB_MALFORMED_DEFINITION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::MalformedDefinition => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The complete set of rule violations for one payload.
///
/// Never empty when constructed through [`ValidationFailure::from_violations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    violations: Vec<String>,
}

impl ValidationFailure {
    /// Wraps a violation list; returns `None` when there is nothing to report.
    pub fn from_violations(violations: Vec<String>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<String> {
        self.violations
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record validation failed: {}", self.violations.join("; "))
    }
}

impl std::error::Error for ValidationFailure {}

/// Schema error type with full context
#[derive(Debug)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    entity_id: Option<Uuid>,
    failure: Option<ValidationFailure>,
}

impl SchemaError {
    /// Create a validation failed error
    pub fn validation_failed(entity_id: Option<Uuid>, failure: ValidationFailure) -> Self {
        Self {
            code: SchemaErrorCode::ValidationFailed,
            message: failure.to_string(),
            entity_id,
            failure: Some(failure),
        }
    }

    /// Create a malformed payload error
    pub fn malformed_payload(actual: &str) -> Self {
        Self {
            code: SchemaErrorCode::MalformedPayload,
            message: format!("Record payload must be an object, got {}", actual),
            entity_id: None,
            failure: None,
        }
    }

    /// Create an unknown entity error
    pub fn unknown_entity(entity_id: Uuid) -> Self {
        Self {
            code: SchemaErrorCode::UnknownEntity,
            message: format!("Entity with ID {} not found", entity_id),
            entity_id: Some(entity_id),
            failure: None,
        }
    }

    /// Create an unknown entity error for a lookup by name
    pub fn unknown_entity_name(name: &str) -> Self {
        Self {
            code: SchemaErrorCode::UnknownEntity,
            message: format!("Entity named '{}' not found", name),
            entity_id: None,
            failure: None,
        }
    }

    /// Create a duplicate entity error
    pub fn duplicate_entity(entity_id: Uuid) -> Self {
        Self {
            code: SchemaErrorCode::DuplicateEntity,
            message: format!("Entity with ID {} is already registered", entity_id),
            entity_id: Some(entity_id),
            failure: None,
        }
    }

    /// Create an error for a malformed definition file
    pub fn malformed_definition(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::MalformedDefinition,
            message: format!("Malformed entity definition '{}': {}", path.into(), reason.into()),
            entity_id: None,
            failure: None,
        }
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn entity_id(&self) -> Option<Uuid> {
        self.entity_id
    }

    /// Returns the violations if this is a validation failure
    pub fn failure(&self) -> Option<&ValidationFailure> {
        self.failure.as_ref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::ValidationFailed.code(), "MODELHUB_VALIDATION_FAILED");
        assert_eq!(SchemaErrorCode::UnknownEntity.code(), "MODELHUB_UNKNOWN_ENTITY");
        assert_eq!(SchemaErrorCode::MalformedDefinition.severity(), Severity::Fatal);
        assert_eq!(SchemaErrorCode::MalformedPayload.severity(), Severity::Reject);
    }

    #[test]
    fn test_empty_violations_are_not_a_failure() {
        assert!(ValidationFailure::from_violations(Vec::new()).is_none());
    }

    #[test]
    fn test_validation_failure_display_lists_all() {
        let failure = ValidationFailure::from_violations(vec![
            "Required field 'name' is missing".into(),
            "Field 'age' must be an integer".into(),
        ])
        .unwrap();

        let err = SchemaError::validation_failed(None, failure);
        let display = err.to_string();
        assert!(display.contains("MODELHUB_VALIDATION_FAILED"));
        assert!(display.contains("'name'"));
        assert!(display.contains("'age'"));
        assert_eq!(err.failure().unwrap().violations().len(), 2);
    }
}
