//! Query executor subsystem
//!
//! Evaluates compiled queries over records held in memory. Backends that can
//! translate `Criteria` natively do not need it.
//!
//! # Execution Flow
//!
//! 1. Filter by criteria (entity scope included)
//! 2. Sort (creation order, then the requested field)
//! 3. Count, then page

mod executor;
mod filters;
mod result;
mod sorter;

pub use executor::QueryExecutor;
pub use filters::{like_match, CriteriaFilter};
pub use result::RecordPage;
pub use sorter::RecordSorter;
