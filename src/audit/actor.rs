//! Acting identity attributed to audited changes

use std::fmt;

use crate::models::UserId;

/// Who is making a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Actor {
    /// A signed-in user
    User(UserId),
    /// Background or maintenance work with no user behind it
    #[default]
    System,
}

impl Actor {
    pub fn from_user_id(user_id: Option<UserId>) -> Self {
        match user_id {
            Some(id) => Actor::User(id),
            None => Actor::System,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::User(id) => Some(*id),
            Actor::System => None,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::User(id) => write!(f, "user {}", id),
            Actor::System => write!(f, "system"),
        }
    }
}

/// Source of the current actor for a new session
pub trait ActorProvider {
    /// The acting user, or `None` for system work
    fn current_actor(&self) -> Option<UserId>;
}

impl ActorProvider for Actor {
    fn current_actor(&self) -> Option<UserId> {
        self.user_id()
    }
}

impl ActorProvider for UserId {
    fn current_actor(&self) -> Option<UserId> {
        Some(*self)
    }
}

impl ActorProvider for Option<UserId> {
    fn current_actor(&self) -> Option<UserId> {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_conversion() {
        assert_eq!(Actor::from_user_id(None), Actor::System);
        assert_eq!(Actor::from_user_id(Some(UserId::new(2))).user_id(), Some(UserId::new(2)));
        assert_eq!(Actor::default().current_actor(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Actor::User(UserId::new(3)).to_string(), "user 3");
        assert_eq!(Actor::System.to_string(), "system");
    }
}
