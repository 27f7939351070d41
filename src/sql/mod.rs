//! SQL generation module.
//!
//! - [`field`] - column references, aggregates and output aliases
//! - [`filter`] - immutable predicate builders
//! - [`select`] - SELECT statement assembly, joins and nested statements
//! - [`render`] - render configuration and parameter output
//! - [`value`] - values and their literal forms
//! - [`token`] - token types for SQL generation

pub mod field;
pub mod filter;
pub mod helpers;
pub(crate) mod persistent;
pub mod render;
pub mod select;
pub mod token;
pub mod value;

#[cfg(test)]
pub mod test_utils;

pub use field::{Aggregate, FieldType, SqlField};
pub use filter::{Comparator, Condition, FilterKind, Predicate, SqlFilter, SqlMultiFilter};
pub use render::{convert_parameters, DbParameter, ParametricSql, RenderConfig, SqlParameter};
pub use select::{ColumnComparison, ColumnRef, JoinKind, SortOrder, SqlSelect};
pub use token::{Token, TokenStream};
pub use value::{AnyValue, ColumnValue, FiniteFloat, SqlValue, ValueKind};
