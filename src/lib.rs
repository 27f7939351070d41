//! # fluentsql
//!
//! Typed, immutable builders for T-SQL predicates and SELECT statements.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Entities + Columns (Person::ID, Person::NAME)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [MetadataProvider: table aliases]
//! ┌─────────────────────────────────────────────────────────┐
//! │                SqlField (pe.Id AS PersonId)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [SqlFilter / SqlMultiFilter]
//! ┌─────────────────────────────────────────────────────────┐
//! │          Predicate chains (shared, never mutated)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [SqlSelect]
//! ┌─────────────────────────────────────────────────────────┐
//! │     SQL text + @p0.. parameters, or literal SQL text     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use fluentsql::prelude::*;
//!
//! struct Person;
//! impl Entity for Person {}
//! impl Person {
//!     const ID: Column<Person, i64> = Column::new("Id");
//!     const NAME: Column<Person, String> = Column::new("Name");
//! }
//!
//! let filter = SqlFilter::of(Person::ID)?.equal_to(5).and(Person::NAME)?.like("A%");
//! let select = SqlSelect::<Person>::new()?.add_field(Person::NAME).filter(&filter);
//!
//! assert_eq!(
//!     select.parametric_sql()?,
//!     "SELECT\r\n    pe.Name\r\nFROM\r\n    Person pe\r\nWHERE\r\n    pe.Id = @p0 AND pe.Name LIKE @p1"
//! );
//! ```

pub mod config;
pub mod error;
pub mod metadata;
pub mod sql;

pub use error::{SqlError, SqlResult};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::error::{SqlError, SqlResult};
    pub use crate::metadata::{Alias, Column, Entity, EntityMeta, MetadataProvider};
    pub use crate::sql::{
        Aggregate, AnyValue, ColumnComparison, Comparator, DbParameter, FiniteFloat, JoinKind,
        ParametricSql, Predicate, SortOrder, SqlField, SqlFilter, SqlMultiFilter, SqlParameter,
        SqlSelect, SqlValue,
    };
}
