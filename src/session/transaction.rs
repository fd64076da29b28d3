//! Session: the transactional boundary
//!
//! Pending work moves through three stages:
//!
//! 1. `add` / `update` / `delete` record intent in the identity map.
//! 2. `flush` runs the registered hooks, then applies the pending changes to
//!    a transaction-local overlay and snapshots each entity's column image.
//! 3. `commit` flushes, builds the next database image (overlay, sequences and
//!    staged audit records), checks constraints and persists it with a single
//!    atomic file replace.
//!
//! Dropping a session without committing discards everything, including
//! audit records staged by hooks.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::audit::PendingAuditRecord;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{AuditRecordId, UserId};
use crate::storage::Storage;

use super::entity::{Entity, EntityId, EntityKey};
use super::unit_of_work::{ColumnHistory, FlushContext, FlushHook, UnitOfWork};
use super::value::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackState {
    New,
    Persistent,
    Deleted,
}

#[derive(Debug, Clone)]
struct Tracked {
    state: TrackState,
    /// Passed to `update` since the last flush
    touched: bool,
    /// Column image as of the last flush (or load); `None` until first flush
    flushed: Option<Row>,
    current: Row,
    document: Value,
}

impl Tracked {
    fn new(current: Row, document: Value) -> Self {
        Self {
            state: TrackState::New,
            touched: false,
            flushed: None,
            current,
            document,
        }
    }

    fn loaded(row: Row, document: Value) -> Self {
        Self {
            state: TrackState::Persistent,
            touched: false,
            flushed: Some(row.clone()),
            current: row,
            document,
        }
    }
}

/// Outcome of a successful commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Entities inserted
    pub inserted: usize,
    /// Entities whose columns changed
    pub updated: usize,
    /// Entities deleted
    pub deleted: usize,
    /// Ids of the audit records written with this commit
    pub audit_records: Vec<AuditRecordId>,
}

/// A unit of work over [`Storage`]
pub struct Session<'a> {
    storage: &'a mut Storage,
    actor: Option<UserId>,
    tracked: BTreeMap<EntityKey, Tracked>,
    /// Flushed but uncommitted rows; `None` marks a deletion
    overlay: BTreeMap<EntityKey, Option<Value>>,
    sequences: BTreeMap<&'static str, i64>,
    staged: Vec<PendingAuditRecord>,
    hooks: Vec<Box<dyn FlushHook>>,
    flushes: usize,
    summary: CommitSummary,
    finished: bool,
}

impl<'a> Session<'a> {
    /// Open a session with no hooks registered
    ///
    /// Most callers want [`Storage::begin`], which also installs the audit hook.
    pub fn new(storage: &'a mut Storage, actor: Option<UserId>) -> Self {
        Self {
            storage,
            actor,
            tracked: BTreeMap::new(),
            overlay: BTreeMap::new(),
            sequences: BTreeMap::new(),
            staged: Vec::new(),
            hooks: Vec::new(),
            flushes: 0,
            summary: CommitSummary::default(),
            finished: false,
        }
    }

    /// User this session acts on behalf of
    pub fn actor(&self) -> Option<UserId> {
        self.actor
    }

    /// Register a hook to run before every flush
    pub fn register_hook(&mut self, hook: Box<dyn FlushHook>) {
        self.hooks.push(hook);
    }

    /// Audit records staged so far and not yet committed
    pub fn audit_staged(&self) -> &[PendingAuditRecord] {
        &self.staged
    }

    /// Reserve the next primary key for entity type `E`
    pub fn allocate_id<E: Entity>(&mut self) -> E::Id {
        let next = self.next_raw_id(E::TYPE_NAME);
        self.sequences.insert(E::TYPE_NAME, next + 1);
        E::Id::from_raw(next)
    }

    /// Track a new entity
    ///
    /// The entity's id must not be in use. Explicit ids advance the type's
    /// sequence past them.
    pub fn add<E: Entity>(&mut self, entity: E) -> TrackerResult<()> {
        let key = entity.key();
        if key.id <= 0 {
            return Err(TrackerError::Validation(format!(
                "{} ids must be positive, got {}",
                E::TYPE_NAME,
                key.id
            )));
        }
        if self.exists(&key) {
            return Err(TrackerError::Duplicate {
                entity_type: E::TYPE_NAME,
                identifier: key.id.to_string(),
            });
        }

        if key.id >= self.next_raw_id(E::TYPE_NAME) {
            self.sequences.insert(E::TYPE_NAME, key.id + 1);
        }

        let document = serde_json::to_value(&entity)?;
        self.tracked.insert(key, Tracked::new(entity.to_row(), document));
        debug!(entity = %key, "added");
        Ok(())
    }

    /// Load an entity, registering it in the identity map
    pub fn get<E: Entity>(&mut self, id: E::Id) -> TrackerResult<Option<E>> {
        let key = EntityKey::of::<E>(id);

        if let Some(tracked) = self.tracked.get(&key) {
            if tracked.state == TrackState::Deleted {
                return Ok(None);
            }
            return Ok(Some(serde_json::from_value(tracked.document.clone())?));
        }

        let Some(document) = self.load_document(&key) else {
            return Ok(None);
        };
        let entity: E = serde_json::from_value(document.clone())?;
        self.tracked
            .insert(key, Tracked::loaded(entity.to_row(), document));
        Ok(Some(entity))
    }

    /// Replace the state of a tracked or stored entity
    ///
    /// A persistent entity becomes dirty even if nothing changed; the diff is
    /// computed at flush time.
    pub fn update<E: Entity>(&mut self, entity: E) -> TrackerResult<()> {
        let key = entity.key();
        let row = entity.to_row();
        let document = serde_json::to_value(&entity)?;

        match self.tracked.get_mut(&key) {
            Some(tracked) => match tracked.state {
                TrackState::Deleted => {
                    return Err(TrackerError::Session(format!(
                        "{} is marked for deletion",
                        key
                    )));
                }
                TrackState::New => {
                    tracked.current = row;
                    tracked.document = document;
                }
                TrackState::Persistent => {
                    tracked.current = row;
                    tracked.document = document;
                    tracked.touched = true;
                }
            },
            None => {
                let stored = self
                    .load_document(&key)
                    .ok_or_else(|| not_found::<E>(&key))?;
                let before: E = serde_json::from_value(stored.clone())?;
                let mut tracked = Tracked::loaded(before.to_row(), stored);
                tracked.current = row;
                tracked.document = document;
                tracked.touched = true;
                self.tracked.insert(key, tracked);
            }
        }

        debug!(entity = %key, "updated");
        Ok(())
    }

    /// Mark an entity for deletion
    ///
    /// Deleting an entity added since the last flush simply forgets it.
    pub fn delete<E: Entity>(&mut self, id: E::Id) -> TrackerResult<()> {
        let key = EntityKey::of::<E>(id);

        match self.tracked.get(&key).map(|t| t.state) {
            Some(TrackState::New) => {
                self.tracked.remove(&key);
                debug!(entity = %key, "discarded before flush");
                return Ok(());
            }
            Some(TrackState::Persistent) => {
                if let Some(tracked) = self.tracked.get_mut(&key) {
                    tracked.state = TrackState::Deleted;
                }
            }
            Some(TrackState::Deleted) => {}
            None => {
                let stored = self
                    .load_document(&key)
                    .ok_or_else(|| not_found::<E>(&key))?;
                let entity: E = serde_json::from_value(stored.clone())?;
                let mut tracked = Tracked::loaded(entity.to_row(), stored);
                tracked.state = TrackState::Deleted;
                self.tracked.insert(key, tracked);
            }
        }

        debug!(entity = %key, "deleted");
        Ok(())
    }

    /// Run hooks, then apply pending changes to the transaction overlay
    pub fn flush(&mut self) -> TrackerResult<()> {
        self.flushes += 1;
        let ctx = FlushContext {
            actor: self.actor,
            flush_number: self.flushes,
        };

        let staged_before = self.staged.len();
        let hooks = std::mem::take(&mut self.hooks);
        let outcome = self.run_hooks(&hooks, &ctx);
        self.hooks = hooks;

        if let Err(err) = outcome {
            self.staged.truncate(staged_before);
            return Err(err);
        }

        self.apply_flush();
        Ok(())
    }

    /// Flush and persist everything atomically
    pub fn commit(mut self) -> TrackerResult<CommitSummary> {
        self.flush()?;

        let mut next = self.storage.database().clone();
        for (key, document) in &self.overlay {
            match document {
                Some(document) => next.put(*key, document.clone()),
                None => next.remove(key),
            }
        }
        for (type_name, next_id) in &self.sequences {
            next.set_sequence(type_name, *next_id);
        }

        let staged = std::mem::take(&mut self.staged);
        let audit_ids = next.append_audit(staged)?;
        self.storage.replace(next)?;

        self.finished = true;
        self.summary.audit_records = audit_ids;
        debug!(
            inserted = self.summary.inserted,
            updated = self.summary.updated,
            deleted = self.summary.deleted,
            audit_records = self.summary.audit_records.len(),
            "committed"
        );
        Ok(std::mem::take(&mut self.summary))
    }

    /// Discard all pending work
    pub fn rollback(mut self) {
        self.finished = true;
        debug!(
            staged_audit = self.staged.len(),
            flushes = self.flushes,
            "rolled back"
        );
    }

    fn run_hooks(&mut self, hooks: &[Box<dyn FlushHook>], ctx: &FlushContext) -> TrackerResult<()> {
        for hook in hooks {
            hook.before_flush(self, ctx)?;
        }
        Ok(())
    }

    fn apply_flush(&mut self) {
        let mut removed = Vec::new();

        for (key, tracked) in self.tracked.iter_mut() {
            match tracked.state {
                TrackState::New => {
                    self.overlay.insert(*key, Some(tracked.document.clone()));
                    tracked.flushed = Some(tracked.current.clone());
                    tracked.state = TrackState::Persistent;
                    self.summary.inserted += 1;
                }
                TrackState::Persistent if tracked.touched => {
                    if tracked.flushed.as_ref() != Some(&tracked.current) {
                        self.summary.updated += 1;
                    }
                    self.overlay.insert(*key, Some(tracked.document.clone()));
                    tracked.flushed = Some(tracked.current.clone());
                    tracked.touched = false;
                }
                TrackState::Persistent => {}
                TrackState::Deleted => {
                    self.overlay.insert(*key, None);
                    removed.push(*key);
                    self.summary.deleted += 1;
                }
            }
        }

        for key in removed {
            self.tracked.remove(&key);
        }

        debug!(flush = self.flushes, overlay = self.overlay.len(), "flushed");
    }

    fn keys_where(&self, predicate: impl Fn(&Tracked) -> bool) -> Vec<EntityKey> {
        self.tracked
            .iter()
            .filter(|(_, tracked)| predicate(tracked))
            .map(|(key, _)| *key)
            .collect()
    }

    fn exists(&self, key: &EntityKey) -> bool {
        self.tracked.contains_key(key) || self.load_document(key).is_some()
    }

    fn load_document(&self, key: &EntityKey) -> Option<Value> {
        match self.overlay.get(key) {
            Some(document) => document.clone(),
            None => self.storage.database().row(key).cloned(),
        }
    }

    fn next_raw_id(&self, type_name: &'static str) -> i64 {
        self.sequences
            .get(type_name)
            .copied()
            .unwrap_or_else(|| self.storage.database().next_id(type_name))
    }

    fn has_pending(&self) -> bool {
        !self.overlay.is_empty()
            || !self.staged.is_empty()
            || self
                .tracked
                .values()
                .any(|t| t.touched || t.state != TrackState::Persistent)
    }
}

impl UnitOfWork for Session<'_> {
    fn new_entities(&self) -> Vec<EntityKey> {
        self.keys_where(|t| t.state == TrackState::New)
    }

    fn dirty_entities(&self) -> Vec<EntityKey> {
        self.keys_where(|t| t.state == TrackState::Persistent && t.touched)
    }

    fn deleted_entities(&self) -> Vec<EntityKey> {
        self.keys_where(|t| t.state == TrackState::Deleted)
    }

    fn columns(&self, key: &EntityKey) -> Vec<&'static str> {
        let Some(tracked) = self.tracked.get(key) else {
            return Vec::new();
        };

        let mut names: Vec<&'static str> = tracked.current.keys().copied().collect();
        if let Some(flushed) = &tracked.flushed {
            for name in flushed.keys() {
                if !names.contains(name) {
                    names.push(name);
                }
            }
        }
        names.sort_unstable();
        names
    }

    fn history(&self, key: &EntityKey, column: &str) -> TrackerResult<ColumnHistory> {
        let unreadable = || TrackerError::Introspection {
            entity: key.to_string(),
            column: column.to_string(),
        };

        let tracked = self.tracked.get(key).ok_or_else(unreadable)?;
        let known = tracked.current.contains_key(column)
            || tracked
                .flushed
                .as_ref()
                .is_some_and(|row| row.contains_key(column));
        if !known {
            return Err(unreadable());
        }

        let old = tracked
            .flushed
            .as_ref()
            .and_then(|row| row.get(column).cloned());
        let new = match tracked.state {
            TrackState::Deleted => None,
            _ => tracked.current.get(column).cloned(),
        };
        Ok(ColumnHistory::new(old, new))
    }

    fn stage_audit(&mut self, record: PendingAuditRecord) {
        self.staged.push(record);
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.finished && self.has_pending() {
            debug!(
                staged_audit = self.staged.len(),
                "session dropped without commit; pending changes discarded"
            );
        }
    }
}

fn not_found<E: Entity>(key: &EntityKey) -> TrackerError {
    TrackerError::NotFound {
        entity_type: E::TYPE_NAME,
        identifier: key.id.to_string(),
    }
}
