//! In-memory record store

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use uuid::Uuid;

use crate::executor::{QueryExecutor, RecordPage, RecordSorter};
use crate::query::{CompiledQuery, Criteria, PageRequest};

use super::errors::{StorageError, StorageResult};
use super::record::Record;
use super::RecordStore;

/// Record store backed by a `BTreeMap` behind a `RwLock`.
///
/// Shareable across threads; readers never block each other.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<Uuid, Record>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-filled with records. Later duplicates replace earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let map = records.into_iter().map(|r| (r.id, r)).collect();
        Self {
            records: RwLock::new(map),
        }
    }

    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, BTreeMap<Uuid, Record>>> {
        self.records
            .read()
            .map_err(|_| StorageError::unavailable("Record store lock poisoned"))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, BTreeMap<Uuid, Record>>> {
        self.records
            .write()
            .map_err(|_| StorageError::unavailable("Record store lock poisoned"))
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert(&self, record: Record) -> StorageResult<Record> {
        let mut records = self.write()?;
        if records.contains_key(&record.id) {
            return Err(StorageError::duplicate_record(record.id));
        }
        records.insert(record.id, record.clone());
        Ok(record)
    }

    fn update(&self, record: Record) -> StorageResult<Record> {
        let mut records = self.write()?;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(record)
            }
            None => Err(StorageError::record_not_found(record.id)),
        }
    }

    fn get(&self, id: Uuid) -> StorageResult<Option<Record>> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn delete(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.write()?.remove(&id).is_some())
    }

    fn delete_by_entity(&self, entity_id: Uuid) -> StorageResult<usize> {
        let mut records = self.write()?;
        let before = records.len();
        records.retain(|_, r| r.entity_id != entity_id);
        let removed = before - records.len();
        debug!(entity_id = %entity_id, removed, "Deleted entity records");
        Ok(removed)
    }

    fn list_by_entity(&self, entity_id: Uuid, page: PageRequest) -> StorageResult<RecordPage> {
        let records = self.read()?;
        let mut matches: Vec<Record> = records
            .values()
            .filter(|r| r.entity_id == entity_id)
            .cloned()
            .collect();
        RecordSorter::sort_by_creation(&mut matches);

        let total = matches.len();
        let records = matches
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();

        Ok(RecordPage {
            records,
            total,
            page: page.page,
            size: page.size,
        })
    }

    fn execute(&self, query: &CompiledQuery) -> StorageResult<RecordPage> {
        let records = self.read()?;
        Ok(QueryExecutor::execute(records.values(), query))
    }

    fn count(&self, criteria: &Criteria) -> StorageResult<usize> {
        let records = self.read()?;
        Ok(QueryExecutor::count(records.values(), criteria))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn payload(value: serde_json::Value) -> Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insert_get_delete() {
        let store = MemoryRecordStore::new();
        let record = Record::new(Uuid::new_v4(), payload(json!({"a": 1})));
        let id = record.id;

        store.insert(record.clone()).unwrap();
        assert_eq!(store.get(id).unwrap(), Some(record.clone()));
        assert_eq!(
            store.insert(record).unwrap_err().code().code(),
            "MODELHUB_DUPLICATE_RECORD"
        );

        assert!(store.delete(id).unwrap());
        assert!(!store.delete(id).unwrap());
        assert!(store.get(id).unwrap().is_none());
    }

    #[test]
    fn test_update_requires_existing() {
        let store = MemoryRecordStore::new();
        let record = Record::new(Uuid::new_v4(), payload(json!({})));
        assert!(store.update(record).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_and_delete_by_entity() {
        let entity = Uuid::new_v4();
        let other = Uuid::new_v4();
        let store = MemoryRecordStore::from_records(vec![
            Record::new(entity, payload(json!({"i": 0}))),
            Record::new(entity, payload(json!({"i": 1}))),
            Record::new(entity, payload(json!({"i": 2}))),
            Record::new(other, payload(json!({"i": 3}))),
        ]);

        let page = store
            .list_by_entity(entity, PageRequest { page: 1, size: 2 })
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.len(), 1);

        assert_eq!(store.delete_by_entity(entity).unwrap(), 3);
        assert_eq!(store.len().unwrap(), 1);
    }
}
