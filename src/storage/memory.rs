//! In-memory storage implementation for tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{AppError, Result};
use crate::models::TrackedRecord;
use crate::storage::RecordStore;

/// Record store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<BTreeMap<String, TrackedRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing insert semantics.
    pub fn with_record(self, id: &str, name: &str, age: &str, available: bool) -> Self {
        self.records.borrow_mut().insert(
            id.to_string(),
            TrackedRecord {
                id: id.to_string(),
                name: name.to_string(),
                age: age.to_string(),
                available,
            },
        );
        self
    }

    /// Snapshot of a single record.
    pub fn get(&self, id: &str) -> Option<TrackedRecord> {
        self.records.borrow().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn upsert_if_absent(&self, id: &str, name: &str, age: &str) -> Result<bool> {
        let mut records = self.records.borrow_mut();
        if records.contains_key(id) {
            return Ok(false);
        }
        records.insert(
            id.to_string(),
            TrackedRecord {
                id: id.to_string(),
                name: name.to_string(),
                age: age.to_string(),
                available: true,
            },
        );
        Ok(true)
    }

    fn mark_unavailable(&self, id: &str) -> Result<()> {
        if let Some(record) = self.records.borrow_mut().get_mut(id) {
            record.available = false;
        }
        Ok(())
    }

    fn is_available(&self, id: &str) -> Result<bool> {
        self.records
            .borrow()
            .get(id)
            .map(|r| r.available)
            .ok_or_else(|| AppError::not_found(id))
    }

    fn name_of(&self, id: &str) -> Result<String> {
        self.records
            .borrow()
            .get(id)
            .map(|r| r.name.clone())
            .ok_or_else(|| AppError::not_found(id))
    }

    fn all_known_ids(&self) -> Result<BTreeSet<String>> {
        Ok(self.records.borrow().keys().cloned().collect())
    }

    fn records(&self) -> Result<Vec<TrackedRecord>> {
        Ok(self.records.borrow().values().cloned().collect())
    }
}
