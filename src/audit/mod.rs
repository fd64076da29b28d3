//! Audit logging system for incident-tracker
//!
//! Records every insert, update and delete of audited entities as an
//! immutable [`AuditRecord`], committed in the same transaction as the
//! change itself.
//!
//! # Architecture
//!
//! - [`ChangeTracker`]: inspects a unit of work before it flushes and
//!   produces one [`ChangeDescriptor`] per audited mutation, with a field diff
//!   for updates.
//! - [`AuditLogWriter`]: stamps descriptors with actor and timestamp and
//!   stages them into the same unit of work.
//! - [`AuditHook`]: the flush hook tying the two together; `Storage::begin`
//!   registers it on every session.
//! - [`list_audit_records`] and friends: the read side.
//!
//! # Example
//!
//! ```rust,ignore
//! use incident_tracker::audit::{list_audit_records, Actor, AuditModel, AuditQuery};
//!
//! let mut session = storage.begin(Actor::User(user_id));
//! session.update(incident)?;
//! session.commit()?;
//!
//! let page = list_audit_records(&storage, &AuditQuery::for_record(AuditModel::Incident, 42))?;
//! ```

mod actor;
mod query;
mod record;
mod serialize;
mod tracker;
mod writer;

pub use actor::{Actor, ActorProvider};
pub use query::{
    list_audit_records, record_history, resolve_actors, user_details_link, ActorLabel, AuditPage, AuditQuery,
    AuditRecordView, AUDIT_LOG_PATH, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use record::{
    AuditAction, AuditModel, AuditRecord, ChangeSet, FieldChange, PendingAuditRecord,
};
pub use serialize::{display_safe, format_value, summarize_changes, to_json_value};
pub use tracker::{ChangeDescriptor, ChangeTracker, ValueChange};
pub use writer::{AuditHook, AuditLogWriter};
