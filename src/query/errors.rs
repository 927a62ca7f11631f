//! # Query Errors
//!
//! Build failures are the caller's fault (bad query). Execution failures come
//! from the record store after a valid predicate was handed over.

use thiserror::Error;

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Whether a query failed while being built or while being run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    Build,
    Execution,
}

/// Query compilation and execution errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    // ==================
    // Build Errors (4xx)
    // ==================
    /// Condition has an empty or blank field name
    #[error("Field name cannot be empty")]
    EmptyField,

    /// Operator is not part of the vocabulary
    #[error("Unsupported operator: {0}")]
    UnknownOperator(String),

    /// Literal cannot take the declared field type
    #[error("Invalid value for field '{field}': expected {expected}, got {value}")]
    InvalidLiteral {
        field: String,
        expected: String,
        value: String,
    },

    /// Membership operator without a usable list
    #[error("Operator '{operator}' on field '{field}' requires a list value")]
    InvalidList { field: String, operator: String },

    /// Operator needs a non-null literal
    #[error("Operator '{operator}' on field '{field}' requires a value")]
    MissingValue { field: String, operator: String },

    /// Page size of zero
    #[error("Page size must be greater than zero")]
    InvalidPageSize,

    // ==================
    // Execution Errors (5xx)
    // ==================
    /// Store failed to run a valid predicate
    #[error("Query execution failed: {0}")]
    Execution(String),
}

impl QueryError {
    pub fn kind(&self) -> QueryErrorKind {
        match self {
            QueryError::Execution(_) => QueryErrorKind::Execution,
            _ => QueryErrorKind::Build,
        }
    }

    /// True when the query itself is at fault
    pub fn is_client_error(&self) -> bool {
        self.kind() == QueryErrorKind::Build
    }

    /// HTTP-equivalent status code
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            QueryErrorKind::Build => 400,
            QueryErrorKind::Execution => 500,
        }
    }
}
