//! Storage layer for incident-tracker
//!
//! Holds the database document in memory and persists it with atomic writes.
//! All mutations go through a [`Session`] opened with [`Storage::begin`].

pub mod audit_log;
pub mod database;
pub mod file_io;

pub use audit_log::AuditLog;
pub use database::Database;
pub use file_io::{read_json, write_json_atomic};

use tracing::debug;

use crate::audit::{ActorProvider, AuditHook};
use crate::config::paths::TrackerPaths;
use crate::error::TrackerResult;
use crate::session::{Entity, EntityKey, Session};

/// Main storage coordinator
pub struct Storage {
    paths: TrackerPaths,
    db: Database,
}

impl Storage {
    /// Open storage, loading the database if one exists
    pub fn open(paths: TrackerPaths) -> TrackerResult<Self> {
        paths.ensure_directories()?;

        let mut db: Database = read_json(paths.database_file())?;
        db.rebuild_indexes();
        debug!(
            path = %paths.database_file().display(),
            audit_records = db.audit_log().len(),
            "storage opened"
        );

        Ok(Self { paths, db })
    }

    /// Open an audited session acting on behalf of `actor`
    pub fn begin(&mut self, actor: impl ActorProvider) -> Session<'_> {
        let actor = actor.current_actor();
        let mut session = Session::new(self, actor);
        session.register_hook(Box::new(AuditHook::new()));
        session
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &TrackerPaths {
        &self.paths
    }

    /// Committed state
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Committed audit log
    pub fn audit_log(&self) -> &AuditLog {
        self.db.audit_log()
    }

    /// Read a committed entity
    pub fn get<E: Entity>(&self, id: E::Id) -> TrackerResult<Option<E>> {
        self.db
            .row(&EntityKey::of::<E>(id))
            .map(|row| serde_json::from_value(row.clone()))
            .transpose()
            .map_err(Into::into)
    }

    /// Read every committed entity of a type, in id order
    pub fn all<E: Entity>(&self) -> TrackerResult<Vec<E>> {
        self.db
            .rows(E::TYPE_NAME)
            .map(|row| serde_json::from_value(row.clone()).map_err(Into::into))
            .collect()
    }

    /// Check if the database has been written at least once
    pub fn is_initialized(&self) -> bool {
        self.paths.database_file().exists()
    }

    /// Persist `next` and make it the committed state
    pub(crate) fn replace(&mut self, next: Database) -> TrackerResult<()> {
        write_json_atomic(self.paths.database_file(), &next)?;
        self.db = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{Actor, AuditAction, AuditModel};
    use crate::models::{Incident, IncidentId, User, UserId};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TrackerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_storage_creation() {
        let (temp_dir, storage) = create_test_storage();

        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
        assert!(storage.audit_log().is_empty());
    }

    #[test]
    fn test_commit_persists_rows_and_audit_together() {
        let (temp_dir, mut storage) = create_test_storage();

        let mut session = storage.begin(Actor::System);
        session
            .add(User::new(UserId::new(1), "Ada", "Lovelace", "ada@example.org"))
            .unwrap();
        session.commit().unwrap();
        assert!(storage.is_initialized());

        let reopened =
            Storage::open(TrackerPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        let users: Vec<User> = reopened.all().unwrap();
        assert_eq!(users.len(), 1);

        let history = reopened.audit_log().for_record(AuditModel::User, 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, AuditAction::Insert);
    }

    #[test]
    fn test_audit_ids_not_reused_after_reopen() {
        let (temp_dir, mut storage) = create_test_storage();

        let mut session = storage.begin(Actor::System);
        session
            .add(Incident::new(IncidentId::new(1), "First", "NY"))
            .unwrap();
        let first = session.commit().unwrap();

        let mut reopened =
            Storage::open(TrackerPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        let mut session = reopened.begin(Actor::System);
        session.delete::<Incident>(IncidentId::new(1)).unwrap();
        let second = session.commit().unwrap();

        assert!(second.audit_records[0] > first.audit_records[0]);
    }

    #[test]
    fn test_get_missing_entity() {
        let (_temp, storage) = create_test_storage();
        assert!(storage.get::<Incident>(IncidentId::new(5)).unwrap().is_none());
    }
}
