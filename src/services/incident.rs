//! Incident service
//!
//! Provides business logic for incident management. Every mutation runs in
//! an audited session attributed to the service's actor.

use crate::audit::Actor;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{Incident, IncidentId, IncidentStatus, User, UserId};
use crate::storage::Storage;

/// Fields for a new incident
#[derive(Debug, Clone, Default)]
pub struct NewIncident {
    pub summary: String,
    pub details: String,
    pub city: String,
    pub state: String,
    pub status: Option<IncidentStatus>,
    pub owner_id: Option<UserId>,
}

/// Partial update of an incident; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct IncidentUpdate {
    pub summary: Option<String>,
    pub details: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: Option<IncidentStatus>,
    /// `Some(None)` clears the owner
    pub owner_id: Option<Option<UserId>>,
}

/// Service for incident management
pub struct IncidentService<'a> {
    storage: &'a mut Storage,
    actor: Actor,
}

impl<'a> IncidentService<'a> {
    /// Create a new incident service acting as `actor`
    pub fn new(storage: &'a mut Storage, actor: Actor) -> Self {
        Self { storage, actor }
    }

    /// Create a new incident
    pub fn create(&mut self, fields: NewIncident) -> TrackerResult<Incident> {
        if let Some(owner_id) = fields.owner_id {
            self.require_user(owner_id)?;
        }

        let mut session = self.storage.begin(self.actor);
        let id = session.allocate_id::<Incident>();

        let mut incident = Incident::new(id, fields.summary.trim(), fields.state.trim());
        incident.details = fields.details;
        incident.city = fields.city.trim().to_string();
        incident.status = fields.status.unwrap_or_default();
        incident.owner_id = fields.owner_id;

        incident
            .validate()
            .map_err(|e| TrackerError::Validation(e.to_string()))?;

        session.add(incident.clone())?;
        session.commit()?;

        Ok(incident)
    }

    /// Get an incident by ID
    pub fn get(&self, id: IncidentId) -> TrackerResult<Option<Incident>> {
        self.storage.get(id)
    }

    /// List incidents, optionally restricted to one status
    pub fn list(&self, status: Option<IncidentStatus>) -> TrackerResult<Vec<Incident>> {
        let incidents: Vec<Incident> = self.storage.all()?;
        Ok(incidents
            .into_iter()
            .filter(|i| status.map_or(true, |s| i.status == s))
            .collect())
    }

    /// Apply a partial update
    ///
    /// Saving without any effective change is allowed and leaves no audit
    /// trail.
    pub fn update(&mut self, id: IncidentId, changes: IncidentUpdate) -> TrackerResult<Incident> {
        if let Some(Some(owner_id)) = changes.owner_id {
            self.require_user(owner_id)?;
        }

        let mut session = self.storage.begin(self.actor);
        let mut incident: Incident = session
            .get(id)?
            .ok_or_else(|| TrackerError::incident_not_found(id.to_string()))?;

        if let Some(summary) = changes.summary {
            incident.summary = summary.trim().to_string();
        }
        if let Some(details) = changes.details {
            incident.details = details;
        }
        if let Some(city) = changes.city {
            incident.city = city.trim().to_string();
        }
        if let Some(state) = changes.state {
            incident.state = state.trim().to_uppercase();
        }
        if let Some(status) = changes.status {
            incident.status = status;
        }
        if let Some(owner_id) = changes.owner_id {
            incident.owner_id = owner_id;
        }

        incident
            .validate()
            .map_err(|e| TrackerError::Validation(e.to_string()))?;

        session.update(incident.clone())?;
        session.commit()?;

        Ok(incident)
    }

    /// Delete an incident, returning its last state
    pub fn delete(&mut self, id: IncidentId) -> TrackerResult<Incident> {
        let mut session = self.storage.begin(self.actor);
        let incident: Incident = session
            .get(id)?
            .ok_or_else(|| TrackerError::incident_not_found(id.to_string()))?;

        session.delete::<Incident>(id)?;
        session.commit()?;

        Ok(incident)
    }

    fn require_user(&self, user_id: UserId) -> TrackerResult<()> {
        match self.storage.get::<User>(user_id)? {
            Some(_) => Ok(()),
            None => Err(TrackerError::user_not_found(user_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{list_audit_records, AuditAction, AuditModel, AuditQuery};
    use crate::config::paths::TrackerPaths;
    use crate::services::UserService;
    use crate::models::UserRole;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TrackerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::open(paths).unwrap();
        UserService::new(&mut storage, Actor::System)
            .create("Admin", "User", "admin@example.org", vec![UserRole::Admin])
            .unwrap();
        (temp_dir, storage)
    }

    fn new_incident(summary: &str) -> NewIncident {
        NewIncident {
            summary: summary.into(),
            state: "ny".into(),
            ..Default::default()
        }
    }

    fn admin() -> Actor {
        Actor::User(UserId::new(1))
    }

    #[test]
    fn test_create_incident() {
        let (_temp, mut storage) = create_test_storage();
        let mut service = IncidentService::new(&mut storage, admin());

        let incident = service.create(new_incident("Graffiti")).unwrap();
        assert_eq!(incident.id, IncidentId::new(1));
        assert_eq!(incident.state, "NY");
        assert_eq!(service.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_create_validates() {
        let (_temp, mut storage) = create_test_storage();
        let mut service = IncidentService::new(&mut storage, admin());

        let err = service.create(new_incident("   ")).unwrap_err();
        assert!(err.is_validation());

        let mut fields = new_incident("Owned");
        fields.owner_id = Some(UserId::new(42));
        assert!(service.create(fields).unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_and_filter_by_status() {
        let (_temp, mut storage) = create_test_storage();
        let mut service = IncidentService::new(&mut storage, admin());
        let incident = service.create(new_incident("Flyers")).unwrap();
        service.create(new_incident("Slur")).unwrap();

        let updated = service
            .update(
                incident.id,
                IncidentUpdate {
                    status: Some(IncidentStatus::Filed),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, IncidentStatus::Filed);
        assert_eq!(service.list(Some(IncidentStatus::Filed)).unwrap().len(), 1);
        assert_eq!(service.list(Some(IncidentStatus::Active)).unwrap().len(), 1);
    }

    #[test]
    fn test_update_missing_incident() {
        let (_temp, mut storage) = create_test_storage();
        let mut service = IncidentService::new(&mut storage, admin());
        let err = service
            .update(IncidentId::new(9), IncidentUpdate::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_is_audited() {
        let (_temp, mut storage) = create_test_storage();
        let mut service = IncidentService::new(&mut storage, admin());
        let incident = service.create(new_incident("Temporary")).unwrap();
        service.delete(incident.id).unwrap();
        assert!(service.get(incident.id).unwrap().is_none());

        let page = list_audit_records(
            &storage,
            &AuditQuery::for_record(AuditModel::Incident, incident.id.get()),
        )
        .unwrap();
        let actions: Vec<AuditAction> = page.records.iter().map(|r| r.action).collect();
        assert_eq!(actions, vec![AuditAction::Insert, AuditAction::Delete]);
    }

    #[test]
    fn test_invalid_update_is_not_committed() {
        let (_temp, mut storage) = create_test_storage();
        let mut service = IncidentService::new(&mut storage, admin());
        let incident = service.create(new_incident("Stable")).unwrap();

        let err = service
            .update(
                incident.id,
                IncidentUpdate {
                    state: Some("Ohio".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(service.get(incident.id).unwrap().unwrap().state, "NY");
    }
}
