//! Audit log writer and the flush hook that drives it
//!
//! The writer turns change descriptors into staged audit records inside the
//! same unit of work, so they commit or roll back together with the
//! mutation they describe.

use chrono::Utc;
use tracing::debug;

use crate::error::TrackerResult;
use crate::models::UserId;
use crate::session::{FlushContext, FlushHook, UnitOfWork};

use super::record::{ChangeSet, FieldChange, PendingAuditRecord};
use super::serialize::to_json_value;
use super::tracker::{ChangeDescriptor, ChangeTracker};

/// Stages audit records for change descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditLogWriter;

impl AuditLogWriter {
    pub fn new() -> Self {
        Self
    }

    /// Stage one record per descriptor, attributed to `actor`
    ///
    /// All records staged by one call share a timestamp. Returns the number
    /// of records staged.
    pub fn write(
        &self,
        uow: &mut dyn UnitOfWork,
        descriptors: Vec<ChangeDescriptor>,
        actor: Option<UserId>,
    ) -> usize {
        let timestamp = Utc::now();
        let count = descriptors.len();

        for descriptor in descriptors {
            let changes = descriptor.changes.map(|changes| {
                changes
                    .into_iter()
                    .map(|(column, change)| {
                        (
                            column,
                            FieldChange::new(to_json_value(&change.old), to_json_value(&change.new)),
                        )
                    })
                    .collect::<ChangeSet>()
            });

            uow.stage_audit(PendingAuditRecord {
                model_name: descriptor.model_name,
                action: descriptor.action,
                record_id: descriptor.record_id,
                user_id: actor,
                timestamp,
                changes,
            });
        }

        count
    }
}

/// Flush hook that audits every flush of a session
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditHook {
    tracker: ChangeTracker,
    writer: AuditLogWriter,
}

impl AuditHook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlushHook for AuditHook {
    fn before_flush(&self, uow: &mut dyn UnitOfWork, ctx: &FlushContext) -> TrackerResult<()> {
        let descriptors = self.tracker.collect(&*uow);
        if descriptors.is_empty() {
            return Ok(());
        }

        let staged = self.writer.write(uow, descriptors, ctx.actor);
        debug!(
            staged,
            flush = ctx.flush_number,
            actor = ?ctx.actor,
            "audit records staged"
        );
        Ok(())
    }
}
