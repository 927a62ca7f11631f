//! Result types for query execution

use serde::Serialize;

use crate::storage::Record;

/// One page of matching records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    /// Records in result order
    pub records: Vec<Record>,
    /// Number of matches before paging
    pub total: usize,
    /// Zero-based page number
    pub page: usize,
    pub size: usize,
}

impl RecordPage {
    pub fn empty(page: usize, size: usize) -> Self {
        Self {
            records: Vec::new(),
            total: 0,
            page,
            size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn total_pages(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.total.div_ceil(self.size)
        }
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}
