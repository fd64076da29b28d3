//! The database document
//!
//! Domain rows are stored per table as JSON, keyed by primary key. The audit
//! log lives in the same document so that a commit writes both at once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::audit::PendingAuditRecord;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{AuditRecordId, User, UserId};
use crate::session::EntityKey;

use super::audit_log::AuditLog;

/// Full persisted state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    /// Next primary key per table
    #[serde(default)]
    sequences: BTreeMap<String, i64>,

    /// Table name -> primary key -> row
    #[serde(default)]
    tables: BTreeMap<String, BTreeMap<i64, Value>>,

    #[serde(default)]
    audit_logs: AuditLog,
}

impl Database {
    /// Stored row for an entity
    pub fn row(&self, key: &EntityKey) -> Option<&Value> {
        self.tables.get(key.type_name)?.get(&key.id)
    }

    /// All rows of a table in primary key order
    pub fn rows(&self, type_name: &str) -> impl Iterator<Item = &Value> {
        self.tables.get(type_name).into_iter().flat_map(|t| t.values())
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.row(key).is_some()
    }

    pub fn put(&mut self, key: EntityKey, row: Value) {
        self.tables
            .entry(key.type_name.to_string())
            .or_default()
            .insert(key.id, row);
    }

    pub fn remove(&mut self, key: &EntityKey) {
        if let Some(table) = self.tables.get_mut(key.type_name) {
            table.remove(&key.id);
        }
    }

    /// Next unused primary key for a table
    ///
    /// Never lower than one past the largest stored id, even if the sequence
    /// was lost or edited by hand.
    pub fn next_id(&self, type_name: &str) -> i64 {
        let sequence = self.sequences.get(type_name).copied().unwrap_or(1);
        let past_max = self
            .tables
            .get(type_name)
            .and_then(|t| t.keys().next_back())
            .map(|id| id + 1)
            .unwrap_or(1);
        sequence.max(past_max)
    }

    pub fn set_sequence(&mut self, type_name: &str, next_id: i64) {
        let entry = self.sequences.entry(type_name.to_string()).or_insert(1);
        *entry = (*entry).max(next_id);
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit_logs
    }

    /// Append staged audit records
    ///
    /// Every record's `user_id` must reference an existing user. Either all
    /// records are appended or, on a violation, none are.
    pub fn append_audit(
        &mut self,
        staged: Vec<PendingAuditRecord>,
    ) -> TrackerResult<Vec<AuditRecordId>> {
        for record in &staged {
            if let Some(user_id) = record.user_id {
                if !self.user_exists(user_id) {
                    warn!(
                        user_id = %user_id,
                        model = %record.model_name,
                        record_id = record.record_id,
                        "audit record references a missing user"
                    );
                    return Err(TrackerError::Constraint(format!(
                        "audit record for {}#{} references unknown user {}",
                        record.model_name, record.record_id, user_id
                    )));
                }
            }
        }

        Ok(staged
            .into_iter()
            .map(|record| self.audit_logs.append(record))
            .collect())
    }

    /// Restore in-memory invariants after loading from disk
    pub fn rebuild_indexes(&mut self) {
        self.audit_logs.rebuild_index();
    }

    fn user_exists(&self, user_id: UserId) -> bool {
        self.contains(&EntityKey::of::<User>(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditAction, AuditModel};
    use chrono::Utc;
    use serde_json::json;

    fn pending(user_id: Option<UserId>) -> PendingAuditRecord {
        PendingAuditRecord {
            model_name: AuditModel::Incident,
            action: AuditAction::Insert,
            record_id: 1,
            user_id,
            timestamp: Utc::now(),
            changes: None,
        }
    }

    #[test]
    fn test_put_get_remove() {
        let mut db = Database::default();
        let key = EntityKey::new("Incident", 3);
        db.put(key, json!({"id": 3}));
        assert!(db.contains(&key));
        assert_eq!(db.rows("Incident").count(), 1);

        db.remove(&key);
        assert!(!db.contains(&key));
        assert_eq!(db.rows("School").count(), 0);
    }

    #[test]
    fn test_next_id() {
        let mut db = Database::default();
        assert_eq!(db.next_id("Incident"), 1);

        db.put(EntityKey::new("Incident", 10), json!({}));
        assert_eq!(db.next_id("Incident"), 11);

        db.set_sequence("Incident", 20);
        assert_eq!(db.next_id("Incident"), 20);

        // Sequences never move backwards
        db.set_sequence("Incident", 5);
        assert_eq!(db.next_id("Incident"), 20);
    }

    #[test]
    fn test_append_audit_requires_existing_user() {
        let mut db = Database::default();
        let err = db.append_audit(vec![pending(Some(UserId::new(9)))]).unwrap_err();
        assert!(err.is_constraint());
        assert!(db.audit_log().is_empty());

        db.put(EntityKey::new("User", 9), json!({}));
        let ids = db
            .append_audit(vec![pending(Some(UserId::new(9))), pending(None)])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(db.audit_log().len(), 2);
    }

    #[test]
    fn test_table_keys_survive_json() {
        let mut db = Database::default();
        db.put(EntityKey::new("User", 2), json!({"id": 2}));
        let json = serde_json::to_string(&db).unwrap();
        let back: Database = serde_json::from_str(&json).unwrap();
        assert!(back.contains(&EntityKey::new("User", 2)));
    }
}
