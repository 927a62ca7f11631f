//! API response types
//!
//! JSON envelopes printed by the CLI for every operation.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::ApiError;

/// Success response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub status: String,
    pub data: Value,
}

impl SuccessResponse {
    pub fn new(data: Value) -> Self {
        Self {
            status: "ok".to_string(),
            data,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    /// HTTP-equivalent status
    pub http_status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
}

impl ErrorResponse {
    /// Create from an API error
    pub fn from_error(err: &ApiError) -> Self {
        Self {
            status: "error".to_string(),
            code: err.code().to_string(),
            http_status: err.status_code(),
            message: err.to_string(),
            violations: err.violations().map(<[String]>::to_vec).unwrap_or_default(),
        }
    }
}

/// Unified response type
#[derive(Debug, Clone)]
pub enum Response {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response::Success(SuccessResponse::new(data))
    }

    pub fn error(err: &ApiError) -> Self {
        Response::Error(ErrorResponse::from_error(err))
    }

    /// Convert to pretty JSON
    pub fn to_json(&self) -> String {
        let rendered = match self {
            Response::Success(r) => serde_json::to_string_pretty(r),
            Response::Error(r) => serde_json::to_string_pretty(r),
        };
        rendered.unwrap_or_else(|e| internal_error_json(&e.to_string()))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }
}

/// Envelope used when a response itself fails to serialize
fn internal_error_json(message: &str) -> String {
    json!({
        "status": "error",
        "code": "INTERNAL_ERROR",
        "message": message,
    })
    .to_string()
}

impl<T: Serialize> From<Result<T, ApiError>> for Response {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => match serde_json::to_value(data) {
                Ok(value) => Response::success(value),
                Err(e) => Response::error(&ApiError::Internal(e.to_string())),
            },
            Err(err) => Response::error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValidationFailure;

    #[test]
    fn test_success_response() {
        let resp = Response::success(json!([{"name": "Alice"}]));
        let json = resp.to_json();
        assert!(resp.is_success());
        assert!(json.contains("\"status\": \"ok\""));
        assert!(json.contains("Alice"));
    }

    #[test]
    fn test_error_response_lists_violations() {
        let failure = ValidationFailure::from_violations(vec!["Field 'a' must be a string".into()])
            .unwrap();
        let resp = ErrorResponse::from_error(&ApiError::Validation(failure));
        assert_eq!(resp.http_status, 400);
        assert_eq!(resp.code, "VALIDATION_FAILED");
        assert_eq!(resp.violations, vec!["Field 'a' must be a string"]);
    }

    #[test]
    fn test_from_result() {
        let ok: Result<usize, ApiError> = Ok(3);
        assert!(Response::from(ok).is_success());

        let err: Result<usize, ApiError> = Err(ApiError::NotFound("gone".into()));
        assert!(!Response::from(err).is_success());
    }

    #[test]
    fn test_fallback_envelope_escapes_message() {
        let rendered = internal_error_json(r#"bad "key" at C:\data"#);
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["code"], "INTERNAL_ERROR");
        assert_eq!(parsed["message"], r#"bad "key" at C:\data"#);
    }
}
