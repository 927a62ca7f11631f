//! modelhub - virtual entities over JSON records
//!
//! Entities are declared at runtime as ordered field lists. Record payloads
//! are validated against those fields, and a small SQL-like language filters
//! them:
//!
//! ```text
//! WHERE status = 'active' AND (age > 18 OR vip = true) ORDER BY createdAt DESC
//! ```
//!
//! Query text is parsed into a condition tree, compiled into a predicate
//! scoped to one entity, and handed to a `RecordStore`.

pub mod api;
pub mod cli;
pub mod executor;
pub mod query;
pub mod schema;
pub mod storage;
