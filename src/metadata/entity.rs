//! Entity types and static column references.
//!
//! An entity is any `'static` Rust type standing for a table. Columns are
//! declared as associated constants, which is how property references are
//! expressed without reflection:
//!
//! ```ignore
//! struct Person;
//! impl Entity for Person {}
//! impl Person {
//!     pub const ID: Column<Person, i64> = Column::new("Id");
//!     pub const NAME: Column<Person, String> = Column::new("Name");
//! }
//! ```

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::alias::Alias;
use super::provider::MetadataProvider;
use crate::error::SqlResult;
use crate::sql::field::{FieldType, SqlField};
use crate::sql::select::{ColumnComparison, ColumnRef};
use crate::sql::filter::Comparator;

/// A type that maps to a database table.
pub trait Entity: 'static {
    /// Table name used in `FROM` and `JOIN` clauses.
    ///
    /// Defaults to the type's own name without its module path.
    fn table_name() -> &'static str {
        short_type_name(type_name::<Self>())
    }
}

/// Strip module path and generic arguments from a type name.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Runtime identity of an entity type.
///
/// Equality and hashing use the `TypeId` only.
#[derive(Clone, Copy)]
pub struct EntityMeta {
    type_id: TypeId,
    type_name: &'static str,
    table_name: &'static str,
}

impl EntityMeta {
    pub fn of<E: Entity>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            type_name: short_type_name(type_name::<E>()),
            table_name: E::table_name(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table_name(&self) -> &'static str {
        self.table_name
    }

    /// Whether this describes entity `E`.
    pub fn is<E: Entity>(&self) -> bool {
        self.type_id == TypeId::of::<E>()
    }
}

impl PartialEq for EntityMeta {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EntityMeta {}

impl Hash for EntityMeta {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for EntityMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

/// A typed reference to one column of entity `E` holding values of type `T`.
pub struct Column<E, T> {
    name: &'static str,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<E, T> Clone for Column<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Column<E, T> {}

impl<E, T> fmt::Debug for Column<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Column").field(&self.name).finish()
    }
}

impl<E: Entity, T: 'static> Column<E, T> {
    /// Declare a column. An empty name fails const evaluation.
    pub const fn new(name: &'static str) -> Self {
        assert!(!name.is_empty(), "column name must not be empty");
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub fn entity(&self) -> EntityMeta {
        EntityMeta::of::<E>()
    }

    pub fn field_type(&self) -> FieldType {
        FieldType::of::<T>()
    }

    /// Field qualified with an explicit alias.
    pub fn with_alias(&self, alias: &Alias) -> SqlField {
        SqlField::typed(self.entity(), self.field_type(), Some(alias.clone()), self.name)
    }

    /// Field qualified with the alias registered for `E` in the process-wide provider.
    pub fn resolve(&self) -> SqlResult<SqlField> {
        self.resolve_in(&MetadataProvider::global())
    }

    /// Field qualified with the alias registered for `E` in `provider`.
    pub fn resolve_in(&self, provider: &MetadataProvider) -> SqlResult<SqlField> {
        let alias = provider.alias_for::<E>()?;
        Ok(self.with_alias(&alias))
    }

    pub(crate) fn column_ref(&self) -> ColumnRef {
        ColumnRef::new(self.entity(), self.name)
    }

    /// `self = other`, usable as a join condition in either operand order.
    pub fn eq_column<E2: Entity>(&self, other: Column<E2, T>) -> ColumnComparison {
        self.compare_column(Comparator::Eq, other)
    }

    /// `self <op> other`. Only equality is accepted as a join condition.
    pub fn compare_column<E2: Entity>(
        &self,
        op: Comparator,
        other: Column<E2, T>,
    ) -> ColumnComparison {
        ColumnComparison::new(self.column_ref(), op, other.column_ref())
    }
}
