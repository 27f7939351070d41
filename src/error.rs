//! Error types for query construction and rendering.
//!
//! Every failure is synchronous and local. Argument, alias and join errors are
//! raised by the call that received the bad input; alias collisions between
//! output columns and tables, and references to columns a wrapped statement
//! does not expose, are raised only when a statement is rendered.

use thiserror::Error;

/// Result type for query construction and rendering.
pub type SqlResult<T> = Result<T, SqlError>;

/// Unified error type.
///
/// `Clone` and `PartialEq` so that a failed render can be memoized on the
/// immutable statement that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    /// Invalid caller input: empty names, empty `IN` lists, non-positive `TOP`.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Two entity types would share the same table alias.
    #[error(
        "Alias '{alias}' derived for '{requested}' is already used by '{existing}'. \
         Register explicit aliases with MetadataProvider::initialize before building queries"
    )]
    DuplicateAlias {
        alias: String,
        existing: String,
        requested: String,
    },

    /// A join alias is already used by another join of the same statement.
    #[error("Join alias '{alias}' is already used in this statement")]
    DuplicateJoinAlias { alias: String },

    /// Output column aliases collide with table aliases in scope.
    #[error("Output aliases collide with table aliases: {}", .aliases.join(", "))]
    IncorrectAlias { aliases: Vec<String> },

    /// The outer statement references a column the wrapped statement does not select.
    #[error("Field '{field}' is not selected by the inner statement")]
    UnknownInnerField { field: String },

    /// Unsupported join kind or join-condition shape.
    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl SqlError {
    /// Create an argument error.
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    /// Create a not-supported error.
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported(message.into())
    }
}
