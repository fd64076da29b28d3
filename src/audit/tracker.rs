//! Change tracker
//!
//! Inspects a unit of work right before it flushes and describes every
//! audited mutation it is about to apply. The tracker never writes and never
//! touches the entities it inspects.

use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::session::{ColumnValue, EntityKey, UnitOfWork};

use super::record::{AuditAction, AuditModel};
use super::serialize::display_safe;

/// Display-safe before/after values of a changed column
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub old: ColumnValue,
    pub new: ColumnValue,
}

/// One audited mutation found in a unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDescriptor {
    pub model_name: AuditModel,
    pub action: AuditAction,
    pub record_id: i64,
    /// Changed columns; only present for updates
    pub changes: Option<BTreeMap<String, ValueChange>>,
}

/// Classifies pending entities into insert / update / delete descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeTracker;

impl ChangeTracker {
    pub fn new() -> Self {
        Self
    }

    /// Describe the audited mutations pending in `uow`
    ///
    /// New entities yield `INSERT`, deleted entities yield `DELETE`, and dirty
    /// entities yield one `UPDATE` carrying every changed column, or nothing
    /// when no column value differs.
    pub fn collect(&self, uow: &dyn UnitOfWork) -> Vec<ChangeDescriptor> {
        let mut descriptors = Vec::new();

        for key in uow.new_entities() {
            if let Some(model_name) = audited(&key) {
                descriptors.push(ChangeDescriptor {
                    model_name,
                    action: AuditAction::Insert,
                    record_id: key.id,
                    changes: None,
                });
            }
        }

        for key in uow.dirty_entities() {
            let Some(model_name) = audited(&key) else {
                continue;
            };
            match self.diff(uow, &key) {
                Some(changes) => descriptors.push(ChangeDescriptor {
                    model_name,
                    action: AuditAction::Update,
                    record_id: key.id,
                    changes: Some(changes),
                }),
                None => trace!(entity = %key, "saved without changes"),
            }
        }

        for key in uow.deleted_entities() {
            if let Some(model_name) = audited(&key) {
                descriptors.push(ChangeDescriptor {
                    model_name,
                    action: AuditAction::Delete,
                    record_id: key.id,
                    changes: None,
                });
            }
        }

        descriptors
    }

    /// Changed columns of a dirty entity, or `None` if nothing changed
    fn diff(&self, uow: &dyn UnitOfWork, key: &EntityKey) -> Option<BTreeMap<String, ValueChange>> {
        let mut changes = BTreeMap::new();

        for column in uow.columns(key) {
            match uow.history(key, column) {
                Ok(history) if history.has_changes() => {
                    let old = history.old.unwrap_or(ColumnValue::Null);
                    let new = history.new.unwrap_or(ColumnValue::Null);
                    changes.insert(
                        column.to_string(),
                        ValueChange {
                            old: display_safe(&old),
                            new: display_safe(&new),
                        },
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(entity = %key, column, error = %err, "column skipped in audit diff");
                }
            }
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes)
        }
    }
}

fn audited(key: &EntityKey) -> Option<AuditModel> {
    AuditModel::from_type_name(key.type_name)
}
