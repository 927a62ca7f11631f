//! Record storage
//!
//! The core hands compiled predicates to a `RecordStore` and never touches
//! persistence itself. `MemoryRecordStore` is the reference backend used by
//! the CLI and the tests.
//!
//! # Rules
//!
//! - Every query carries an entity scope; stores must honour it
//! - Sorting and paging are applied after filtering
//! - Store failures surface as `StorageError`, never as panics

mod errors;
mod memory;
mod record;

pub use errors::{StorageError, StorageErrorCode, StorageResult};
pub use memory::MemoryRecordStore;
pub use record::Record;

use uuid::Uuid;

use crate::executor::RecordPage;
use crate::query::{CompiledQuery, Criteria, PageRequest};

/// Persistence collaborator for records.
pub trait RecordStore: Send + Sync {
    /// Stores a new record. Fails if the id is taken.
    fn insert(&self, record: Record) -> StorageResult<Record>;

    /// Replaces an existing record. Fails if the id is unknown.
    fn update(&self, record: Record) -> StorageResult<Record>;

    fn get(&self, id: Uuid) -> StorageResult<Option<Record>>;

    /// Returns false if there was nothing to delete.
    fn delete(&self, id: Uuid) -> StorageResult<bool>;

    /// Returns the number of records removed.
    fn delete_by_entity(&self, entity_id: Uuid) -> StorageResult<usize>;

    /// Records of one entity in creation order.
    fn list_by_entity(&self, entity_id: Uuid, page: PageRequest) -> StorageResult<RecordPage>;

    fn execute(&self, query: &CompiledQuery) -> StorageResult<RecordPage>;

    fn count(&self, criteria: &Criteria) -> StorageResult<usize>;
}
