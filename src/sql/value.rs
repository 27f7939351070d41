//! Values compared against columns, and the literal policy used to inline them.
//!
//! The kind of a value decides its literal form: text, dates, timestamps and
//! GUIDs are quoted; numbers are bare; booleans become `1`/`0`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use super::helpers;
use crate::error::{SqlError, SqlResult};

/// A value bound to a predicate, either inlined or sent as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(FiniteFloat),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Guid(Uuid),
}

/// A float with a SQL literal form: never NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FiniteFloat(f64);

impl FiniteFloat {
    pub fn new(value: f64) -> SqlResult<Self> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(SqlError::argument(format!(
                "{value} has no SQL literal form"
            )))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for FiniteFloat {
    type Error = SqlError;

    fn try_from(value: f64) -> SqlResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<f32> for FiniteFloat {
    type Error = SqlError;

    fn try_from(value: f32) -> SqlResult<Self> {
        Self::new(f64::from(value))
    }
}

/// Semantic type tag of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Float,
    Text,
    Date,
    DateTime,
    Guid,
}

impl ValueKind {
    /// Whether literals of this kind are single-quoted.
    pub fn is_quoted(self) -> bool {
        matches!(
            self,
            ValueKind::Text | ValueKind::Date | ValueKind::DateTime | ValueKind::Guid
        )
    }
}

impl SqlValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SqlValue::Null => ValueKind::Null,
            SqlValue::Bool(_) => ValueKind::Boolean,
            SqlValue::Int(_) => ValueKind::Integer,
            SqlValue::Float(_) => ValueKind::Float,
            SqlValue::String(_) => ValueKind::Text,
            SqlValue::Date(_) => ValueKind::Date,
            SqlValue::DateTime(_) => ValueKind::DateTime,
            SqlValue::Guid(_) => ValueKind::Guid,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// SQL literal text for this value.
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".into(),
            SqlValue::Bool(b) => helpers::format_bool_numeric(*b).into(),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(f) => helpers::format_float(*f),
            SqlValue::String(s) => helpers::quote_string_single(s),
            SqlValue::Date(d) => helpers::format_date(d),
            SqlValue::DateTime(dt) => helpers::format_datetime(dt),
            SqlValue::Guid(g) => helpers::quote_string_single(&g.hyphenated().to_string()),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for SqlValue {
            fn from(v: $t) -> Self {
                SqlValue::Int(i64::from(v))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<FiniteFloat> for SqlValue {
    fn from(v: FiniteFloat) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::String(v.clone())
    }
}

impl From<char> for SqlValue {
    fn from(v: char) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::DateTime(v.naive_utc())
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Guid(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

// =============================================================================
// Typed comparisons
// =============================================================================

/// Marker for values that may be compared with a column of type `C`.
pub trait ColumnValue<C>: Into<SqlValue> {}

/// Column type of untyped (multi-entity) comparisons; accepts any value.
#[derive(Debug, Clone, Copy)]
pub struct AnyValue;

impl<V: Into<SqlValue>> ColumnValue<AnyValue> for V {}

// Nullable columns accept the values of their inner type.
impl<C, V: ColumnValue<C>> ColumnValue<Option<C>> for V {}

macro_rules! column_values {
    ($column:ty => $($value:ty),*) => {
        $(impl ColumnValue<$column> for $value {})*
    };
}

column_values!(i64 => i64, i32, i16, i8, u32, u16, u8);
column_values!(i32 => i32, i16, i8, u16, u8);
column_values!(i16 => i16, i8, u8);
column_values!(u8 => u8);
column_values!(f64 => FiniteFloat, i32);
column_values!(f32 => FiniteFloat);
column_values!(bool => bool);
column_values!(String => String, &str, &String, char);
column_values!(NaiveDate => NaiveDate);
column_values!(NaiveDateTime => NaiveDateTime);
column_values!(DateTime<Utc> => DateTime<Utc>);
column_values!(Uuid => Uuid);
