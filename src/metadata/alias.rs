//! Table aliases.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::entity::{Entity, EntityMeta};
use crate::error::{SqlError, SqlResult};

/// A named handle for a table within a statement (`pe` for `Person`).
///
/// Two aliases are equal when their names match ignoring ASCII case, as T-SQL
/// identifiers do; the bound entity type is metadata only.
#[derive(Clone)]
pub struct Alias {
    name: Arc<str>,
    entity: Option<EntityMeta>,
}

impl Alias {
    /// Untyped alias.
    pub fn new(name: &str) -> SqlResult<Self> {
        Self::build(name, None)
    }

    /// Alias bound to entity `E`.
    pub fn of<E: Entity>(name: &str) -> SqlResult<Self> {
        Self::build(name, Some(EntityMeta::of::<E>()))
    }

    /// Alias bound to an entity known only at runtime.
    pub fn for_entity(entity: EntityMeta, name: &str) -> SqlResult<Self> {
        Self::build(name, Some(entity))
    }

    fn build(name: &str, entity: Option<EntityMeta>) -> SqlResult<Self> {
        if name.trim().is_empty() {
            return Err(SqlError::argument("alias name must not be empty"));
        }
        Ok(Self {
            name: Arc::from(name),
            entity,
        })
    }

    pub fn value(&self) -> &str {
        &self.name
    }

    pub fn entity(&self) -> Option<EntityMeta> {
        self.entity
    }
}

impl PartialEq for Alias {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for Alias {}

impl Hash for Alias {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.name.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entity {
            Some(entity) => write!(f, "Alias({} -> {:?})", self.name, entity),
            None => write!(f, "Alias({})", self.name),
        }
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
