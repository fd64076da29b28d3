//! School service
//!
//! Schools go through the same sessions as audited entities but are not on
//! the audit allow-list.

use crate::audit::Actor;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{School, SchoolId};
use crate::storage::Storage;

/// Service for school reference data
pub struct SchoolService<'a> {
    storage: &'a mut Storage,
    actor: Actor,
}

impl<'a> SchoolService<'a> {
    pub fn new(storage: &'a mut Storage, actor: Actor) -> Self {
        Self { storage, actor }
    }

    /// Create a new school
    pub fn create(&mut self, name: &str, city: &str, state: &str) -> TrackerResult<School> {
        let name = name.trim();
        let duplicate = self
            .list()?
            .into_iter()
            .any(|s| s.name.eq_ignore_ascii_case(name) && s.state.eq_ignore_ascii_case(state.trim()));
        if duplicate {
            return Err(TrackerError::Duplicate {
                entity_type: "School",
                identifier: name.to_string(),
            });
        }

        let mut session = self.storage.begin(self.actor);
        let id = session.allocate_id::<School>();
        let mut school = School::new(id, name, state.trim());
        school.city = city.trim().to_string();

        school
            .validate()
            .map_err(|e| TrackerError::Validation(e.to_string()))?;

        session.add(school.clone())?;
        session.commit()?;

        Ok(school)
    }

    /// Get a school by ID
    pub fn get(&self, id: SchoolId) -> TrackerResult<Option<School>> {
        self.storage.get(id)
    }

    /// Get all schools in id order
    pub fn list(&self) -> TrackerResult<Vec<School>> {
        self.storage.all()
    }
}
