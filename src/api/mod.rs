//! API layer
//!
//! `RecordApi` fronts validation, query parsing/compilation and the record
//! store. Errors are folded into `ApiError`, each with an HTTP-equivalent
//! status.
//!
//! # Supported Operations
//!
//! - validate_record, parse_query_string, compile_query
//! - create_record, update_record, get_record, delete_record
//! - delete_records_by_entity, records_by_entity
//! - execute_query, count_query, query_by_entity_name

mod errors;
mod handler;
mod response;

pub use errors::{ApiError, ApiResult};
pub use handler::{RecordApi, DEFAULT_MAX_PAGE_SIZE};
pub use response::{ErrorResponse, Response, SuccessResponse};
