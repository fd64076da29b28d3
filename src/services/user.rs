//! User service
//!
//! Provides business logic for user management, including the unique email
//! constraint and seeding the initial administrator.

use crate::audit::Actor;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{Incident, User, UserId, UserRole};
use crate::storage::Storage;

/// Partial update of a user; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub roles: Option<Vec<UserRole>>,
}

/// Service for user management
pub struct UserService<'a> {
    storage: &'a mut Storage,
    actor: Actor,
}

impl<'a> UserService<'a> {
    /// Create a new user service acting as `actor`
    pub fn new(storage: &'a mut Storage, actor: Actor) -> Self {
        Self { storage, actor }
    }

    /// Create a new user
    pub fn create(
        &mut self,
        first_name: &str,
        last_name: &str,
        email: &str,
        roles: Vec<UserRole>,
    ) -> TrackerResult<User> {
        if self.find_by_email(email)?.is_some() {
            return Err(TrackerError::Duplicate {
                entity_type: "User",
                identifier: email.trim().to_lowercase(),
            });
        }

        let mut session = self.storage.begin(self.actor);
        let id = session.allocate_id::<User>();
        let user = User::new(id, first_name.trim(), last_name.trim(), email).with_roles(roles);

        user.validate()
            .map_err(|e| TrackerError::Validation(e.to_string()))?;

        session.add(user.clone())?;
        session.commit()?;

        Ok(user)
    }

    /// Create the administrator if no user has this email yet
    ///
    /// Returns the new user, or `None` if one already existed.
    pub fn ensure_admin(&mut self, email: &str) -> TrackerResult<Option<User>> {
        if self.find_by_email(email)?.is_some() {
            return Ok(None);
        }
        self.create("Admin", "User", email, vec![UserRole::Admin])
            .map(Some)
    }

    /// Get a user by ID
    pub fn get(&self, id: UserId) -> TrackerResult<Option<User>> {
        self.storage.get(id)
    }

    /// Find a user by email (case-insensitive)
    pub fn find_by_email(&self, email: &str) -> TrackerResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(&email)))
    }

    /// Find a user by ID or email
    pub fn find(&self, identifier: &str) -> TrackerResult<Option<User>> {
        if let Ok(id) = identifier.parse::<UserId>() {
            return self.get(id);
        }
        self.find_by_email(identifier)
    }

    /// Get all users in id order
    pub fn list(&self) -> TrackerResult<Vec<User>> {
        self.storage.all()
    }

    /// Apply a partial update
    pub fn update(&mut self, id: UserId, changes: UserUpdate) -> TrackerResult<User> {
        if let Some(email) = &changes.email {
            if let Some(existing) = self.find_by_email(email)? {
                if existing.id != id {
                    return Err(TrackerError::Duplicate {
                        entity_type: "User",
                        identifier: existing.email,
                    });
                }
            }
        }

        let mut session = self.storage.begin(self.actor);
        let mut user: User = session
            .get(id)?
            .ok_or_else(|| TrackerError::user_not_found(id.to_string()))?;

        if let Some(first_name) = changes.first_name {
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name.trim().to_string();
        }
        if let Some(email) = changes.email {
            user.email = email.trim().to_lowercase();
        }
        if let Some(roles) = changes.roles {
            user.set_roles(roles);
        }

        user.validate()
            .map_err(|e| TrackerError::Validation(e.to_string()))?;

        session.update(user.clone())?;
        session.commit()?;

        Ok(user)
    }

    /// Delete a user
    ///
    /// Users who still own incidents cannot be deleted.
    pub fn delete(&mut self, id: UserId) -> TrackerResult<User> {
        let owned = self
            .storage
            .all::<Incident>()?
            .into_iter()
            .filter(|i| i.owner_id == Some(id))
            .count();
        if owned > 0 {
            return Err(TrackerError::Validation(format!(
                "User {} still owns {} incident(s)",
                id, owned
            )));
        }

        let mut session = self.storage.begin(self.actor);
        let user: User = session
            .get(id)?
            .ok_or_else(|| TrackerError::user_not_found(id.to_string()))?;

        session.delete::<User>(id)?;
        session.commit()?;

        Ok(user)
    }
}
