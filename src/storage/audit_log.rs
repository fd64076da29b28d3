//! Append-only audit log store
//!
//! Records are kept in id order. An index on `(model_name, record_id)` makes
//! per-entity history lookups cheap; it is not persisted and is rebuilt on
//! load.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::audit::{AuditModel, AuditRecord, PendingAuditRecord};
use crate::models::AuditRecordId;

fn first_id() -> i64 {
    1
}

/// The persisted audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Next id to hand out; ids are never reused
    #[serde(default = "first_id")]
    next_id: i64,

    #[serde(default)]
    records: Vec<AuditRecord>,

    #[serde(skip)]
    index: HashMap<(AuditModel, i64), Vec<usize>>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl AuditLog {
    /// Append a staged record, assigning the next id
    pub fn append(&mut self, pending: PendingAuditRecord) -> AuditRecordId {
        let id = AuditRecordId::new(self.next_id);
        self.next_id += 1;

        let record = AuditRecord::from_pending(id, pending);
        self.index
            .entry((record.model_name, record.record_id))
            .or_default()
            .push(self.records.len());
        self.records.push(record);
        id
    }

    /// All records, oldest first
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    /// Look up a record by id
    pub fn get(&self, id: AuditRecordId) -> Option<&AuditRecord> {
        self.records
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|pos| &self.records[pos])
    }

    /// History of one entity, oldest first
    pub fn for_record(&self, model_name: AuditModel, record_id: i64) -> Vec<&AuditRecord> {
        self.index
            .get(&(model_name, record_id))
            .map(|positions| positions.iter().map(|&pos| &self.records[pos]).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Restore in-memory invariants after deserializing
    ///
    /// Sorts records by id, rebuilds the index and makes sure `next_id` is
    /// past every stored id.
    pub fn rebuild_index(&mut self) {
        self.records.sort_by_key(|r| r.id);
        self.index.clear();
        for (pos, record) in self.records.iter().enumerate() {
            self.index
                .entry((record.model_name, record.record_id))
                .or_default()
                .push(pos);
        }

        let max_id = self.records.last().map(|r| r.id.get()).unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1);
    }
}
