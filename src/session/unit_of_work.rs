//! The interface the audit core consumes from the persistence layer

use crate::audit::PendingAuditRecord;
use crate::error::TrackerResult;
use crate::models::UserId;

use super::entity::EntityKey;
use super::value::ColumnValue;

/// Before/after values of one column since the last flush
///
/// `old` is `None` when the entity had not been flushed yet; `new` is `None`
/// for deleted entities.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnHistory {
    pub old: Option<ColumnValue>,
    pub new: Option<ColumnValue>,
}

impl ColumnHistory {
    pub fn new(old: Option<ColumnValue>, new: Option<ColumnValue>) -> Self {
        Self { old, new }
    }

    /// Whether the column value differs between the two images
    pub fn has_changes(&self) -> bool {
        self.old != self.new
    }
}

/// Pending state of a unit of work, as seen at flush time
///
/// The three entity sets are disjoint. Implementations return keys in a
/// stable order.
pub trait UnitOfWork {
    /// Entities added since the last flush
    fn new_entities(&self) -> Vec<EntityKey>;

    /// Persistent entities passed to `update` since the last flush,
    /// whether or not any column actually changed
    fn dirty_entities(&self) -> Vec<EntityKey>;

    /// Entities marked for deletion
    fn deleted_entities(&self) -> Vec<EntityKey>;

    /// Persisted column names of a tracked entity
    fn columns(&self, key: &EntityKey) -> Vec<&'static str>;

    /// History of one column of a tracked entity
    fn history(&self, key: &EntityKey, column: &str) -> TrackerResult<ColumnHistory>;

    /// Queue an audit record to be committed with this unit of work
    fn stage_audit(&mut self, record: PendingAuditRecord);
}

/// Ambient information handed to flush hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushContext {
    /// User the session acts on behalf of; `None` for system work
    pub actor: Option<UserId>,
    /// 1-based index of this flush within the session
    pub flush_number: usize,
}

/// Callback run before a flush applies pending changes
///
/// `Session::commit` always flushes first, so a hook also runs strictly
/// before the enclosing commit is finalized. An error aborts the flush and
/// with it the commit.
pub trait FlushHook {
    fn before_flush(&self, uow: &mut dyn UnitOfWork, ctx: &FlushContext) -> TrackerResult<()>;
}
