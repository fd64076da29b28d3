//! Entities tracked by the session

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::value::Row;

/// Integer primary keys
pub trait EntityId: Copy + Eq + fmt::Display {
    /// Build the id from its raw storage value
    fn from_raw(raw: i64) -> Self;

    /// Raw storage value
    fn raw(&self) -> i64;
}

/// A persistent entity
///
/// The serde representation is what gets stored; [`Entity::to_row`] is the
/// column view the session diffs.
pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// Logical type name, also the table name in storage
    const TYPE_NAME: &'static str;

    /// Primary key type
    type Id: EntityId;

    /// Primary key of this instance
    fn id(&self) -> Self::Id;

    /// Current persisted columns
    fn to_row(&self) -> Row;

    /// Identity map key of this instance
    fn key(&self) -> EntityKey {
        EntityKey::new(Self::TYPE_NAME, self.id().raw())
    }
}

/// Identity of a tracked entity: its type name plus primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub type_name: &'static str,
    pub id: i64,
}

impl EntityKey {
    pub fn new(type_name: &'static str, id: i64) -> Self {
        Self { type_name, id }
    }

    /// Key for entity type `E`
    pub fn of<E: Entity>(id: E::Id) -> Self {
        Self::new(E::TYPE_NAME, id.raw())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(EntityKey::new("Incident", 42).to_string(), "Incident#42");
    }

    #[test]
    fn test_key_ordering_groups_by_type() {
        let mut keys = vec![
            EntityKey::new("User", 1),
            EntityKey::new("Incident", 2),
            EntityKey::new("Incident", 1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                EntityKey::new("Incident", 1),
                EntityKey::new("Incident", 2),
                EntityKey::new("User", 1),
            ]
        );
    }
}
