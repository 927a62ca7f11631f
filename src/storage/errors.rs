//! Storage error types
//!
//! Error codes:
//! - MODELHUB_RECORD_NOT_FOUND
//! - MODELHUB_DUPLICATE_RECORD
//! - MODELHUB_STORAGE_UNAVAILABLE
//! - MODELHUB_STORAGE_IO_ERROR

use std::fmt;
use std::io;

use uuid::Uuid;

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// No record with the given id
    RecordNotFound,
    /// A record with the given id already exists
    DuplicateRecord,
    /// Store cannot serve requests (poisoned lock, lost connection)
    Unavailable,
    /// Disk I/O or decoding failure
    IoError,
}

impl StorageErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::RecordNotFound => "MODELHUB_RECORD_NOT_FOUND",
            StorageErrorCode::DuplicateRecord => "MODELHUB_DUPLICATE_RECORD",
            StorageErrorCode::Unavailable => "MODELHUB_STORAGE_UNAVAILABLE",
            StorageErrorCode::IoError => "MODELHUB_STORAGE_IO_ERROR",
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error type with full context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl StorageError {
    pub fn record_not_found(id: Uuid) -> Self {
        Self {
            code: StorageErrorCode::RecordNotFound,
            message: format!("Record with ID {} not found", id),
            source: None,
        }
    }

    pub fn duplicate_record(id: Uuid) -> Self {
        Self {
            code: StorageErrorCode::DuplicateRecord,
            message: format!("Record with ID {} already exists", id),
            source: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::Unavailable,
            message: message.into(),
            source: None,
        }
    }

    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::IoError,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Decoding failure without an underlying I/O error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::IoError,
            message: message.into(),
            source: None,
        }
    }

    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_not_found(&self) -> bool {
        self.code == StorageErrorCode::RecordNotFound
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let id = Uuid::nil();
        let err = StorageError::record_not_found(id);
        assert!(err.is_not_found());
        assert_eq!(err.code().code(), "MODELHUB_RECORD_NOT_FOUND");
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error;

        let err = StorageError::io_error(
            "Failed to read records",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("caused by: missing"));
    }
}
