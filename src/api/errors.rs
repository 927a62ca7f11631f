//! # API Errors
//!
//! Client-facing error taxonomy. Lower subsystem errors are folded into one
//! of these, each with an HTTP-equivalent status.

use thiserror::Error;
use tracing::error;

use crate::query::QueryError;
use crate::schema::{SchemaError, SchemaErrorCode, ValidationFailure};
use crate::storage::StorageError;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Payload violates the entity's fields; carries every violation
    #[error("{0}")]
    Validation(ValidationFailure),

    /// Query could not be built
    #[error("Invalid query: {0}")]
    QueryBuild(QueryError),

    /// Payload is not a JSON object
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Entity or record not found
    #[error("{0}")]
    NotFound(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Store failed to run a valid query
    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::QueryBuild(_) => "QUERY_BUILD_FAILED",
            ApiError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::QueryExecution(_) => "QUERY_EXECUTION_FAILED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP-equivalent status code
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            ApiError::Validation(_) => 400,
            ApiError::QueryBuild(_) => 400,
            ApiError::MalformedPayload(_) => 400,

            // 404 Not Found
            ApiError::NotFound(_) => 404,

            // 500 Internal Server Error
            ApiError::QueryExecution(_) => 500,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Violation messages, if this is a validation failure
    pub fn violations(&self) -> Option<&[String]> {
        match self {
            ApiError::Validation(failure) => Some(failure.violations()),
            _ => None,
        }
    }
}

impl From<ValidationFailure> for ApiError {
    fn from(failure: ValidationFailure) -> Self {
        ApiError::Validation(failure)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        if err.is_client_error() {
            ApiError::QueryBuild(err)
        } else {
            ApiError::QueryExecution(err.to_string())
        }
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        match err.code() {
            SchemaErrorCode::ValidationFailed => match err.failure() {
                Some(failure) => ApiError::Validation(failure.clone()),
                None => ApiError::Internal(err.message().to_string()),
            },
            SchemaErrorCode::MalformedPayload => ApiError::MalformedPayload(err.message().to_string()),
            SchemaErrorCode::UnknownEntity => ApiError::NotFound(err.message().to_string()),
            SchemaErrorCode::DuplicateEntity | SchemaErrorCode::MalformedDefinition => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if err.is_not_found() {
            return ApiError::NotFound(err.message().to_string());
        }
        error!(code = %err.code(), error = %err, "Record store operation failed");
        ApiError::QueryExecution(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        let failure = ValidationFailure::from_violations(vec!["x".into()]).unwrap();
        assert_eq!(ApiError::from(failure).status_code(), 400);
        assert_eq!(ApiError::from(QueryError::EmptyField).status_code(), 400);
        assert_eq!(ApiError::from(QueryError::Execution("down".into())).status_code(), 500);
        assert_eq!(
            ApiError::from(SchemaError::unknown_entity(Uuid::nil())).status_code(),
            404
        );
        assert_eq!(ApiError::from(SchemaError::malformed_payload("array")).status_code(), 400);
        assert_eq!(
            ApiError::from(StorageError::record_not_found(Uuid::nil())).status_code(),
            404
        );
        assert_eq!(
            ApiError::from(StorageError::unavailable("lock poisoned")).status_code(),
            500
        );
    }

    #[test]
    fn test_validation_keeps_every_violation() {
        let failure = ValidationFailure::from_violations(vec![
            "Required field 'name' is missing".into(),
            "Field 'age' must be an integer".into(),
        ])
        .unwrap();
        let err = ApiError::from(SchemaError::validation_failed(None, failure));

        assert_eq!(err.code(), "VALIDATION_FAILED");
        assert_eq!(err.violations().map(<[String]>::len), Some(2));
        assert!(err.is_client_error());
    }
}
