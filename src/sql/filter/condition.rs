//! Pending comparison: a filter plus the left operand waiting for an operator.

use std::fmt;
use std::marker::PhantomData;

use super::item::{Comparator, Comparison, FilterItem, Operand};
use super::{FilterKind, SqlMultiFilter};
use crate::error::{SqlError, SqlResult};
use crate::metadata::{Column, Entity};
use crate::sql::field::SqlField;
use crate::sql::select::SqlSelect;
use crate::sql::value::{ColumnValue, SqlValue};

/// Left-hand side of a comparison, bound to a filter of kind `F`.
///
/// `T` is the declared value type of the left column; comparisons only
/// accept values compatible with it. Completing the condition returns the
/// extended filter.
#[must_use = "a condition does nothing until an operator completes it"]
pub struct Condition<F, T> {
    filter: SqlMultiFilter,
    left: Operand,
    _marker: PhantomData<fn() -> (F, T)>,
}

impl<F, T> fmt::Debug for Condition<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("left", &self.left)
            .finish_non_exhaustive()
    }
}

impl<F, T> Condition<F, T> {
    pub(crate) fn new(filter: SqlMultiFilter, left: Operand) -> Self {
        Self {
            filter,
            left,
            _marker: PhantomData,
        }
    }

    fn push(self, op: Comparator, right: Vec<Operand>) -> SqlMultiFilter {
        self.filter.push(FilterItem::Comparison(Comparison {
            left: self.left,
            op,
            right,
        }))
    }

    // =========================================================================
    // Field operands (always rendered inline, never parameterized)
    // =========================================================================

    /// `left op field`; the result may span several entities.
    pub fn compare_field(self, op: Comparator, field: SqlField) -> SqlResult<SqlMultiFilter> {
        if !op.is_binary() {
            return Err(SqlError::argument(format!(
                "{op:?} does not compare against a single field"
            )));
        }
        Ok(self.push(op, vec![Operand::Field(field)]))
    }

    /// `left = field`; the result may span several entities.
    pub fn equal_to_field(self, field: SqlField) -> SqlMultiFilter {
        self.push(Comparator::Eq, vec![Operand::Field(field)])
    }

    /// `left = column`, resolving the column's alias through the filter's provider.
    pub fn equal_to_column<E2: Entity>(self, column: Column<E2, T>) -> SqlResult<SqlMultiFilter>
    where
        T: 'static,
    {
        let field = column.resolve_in(self.filter.provider())?;
        Ok(self.equal_to_field(field))
    }
}

impl<F: FilterKind, T> Condition<F, T> {
    fn finish(self, op: Comparator, right: Vec<Operand>) -> F {
        <F as super::private::Sealed>::from_multi(self.push(op, right))
    }

    fn value<V: ColumnValue<T>>(value: V) -> Operand {
        Operand::Value(value.into())
    }

    /// `left op value` for any binary comparator.
    pub fn compare<V: ColumnValue<T>>(self, op: Comparator, value: V) -> SqlResult<F> {
        if !op.is_binary() {
            return Err(SqlError::argument(format!(
                "{op:?} does not compare against a single value"
            )));
        }
        Ok(self.finish(op, vec![Self::value(value)]))
    }

    pub fn equal_to<V: ColumnValue<T>>(self, value: V) -> F {
        self.finish(Comparator::Eq, vec![Self::value(value)])
    }

    pub fn not_equal_to<V: ColumnValue<T>>(self, value: V) -> F {
        self.finish(Comparator::Ne, vec![Self::value(value)])
    }

    pub fn greater_than<V: ColumnValue<T>>(self, value: V) -> F {
        self.finish(Comparator::Gt, vec![Self::value(value)])
    }

    pub fn greater_than_or_equal<V: ColumnValue<T>>(self, value: V) -> F {
        self.finish(Comparator::Gte, vec![Self::value(value)])
    }

    pub fn less_than<V: ColumnValue<T>>(self, value: V) -> F {
        self.finish(Comparator::Lt, vec![Self::value(value)])
    }

    pub fn less_than_or_equal<V: ColumnValue<T>>(self, value: V) -> F {
        self.finish(Comparator::Lte, vec![Self::value(value)])
    }

    /// `left LIKE pattern`; the pattern is passed through untouched.
    pub fn like(self, pattern: impl Into<String>) -> F {
        let pattern = SqlValue::String(pattern.into());
        self.finish(Comparator::Like, vec![Operand::Value(pattern)])
    }

    pub fn not_like(self, pattern: impl Into<String>) -> F {
        let pattern = SqlValue::String(pattern.into());
        self.finish(Comparator::NotLike, vec![Operand::Value(pattern)])
    }

    pub fn is_null(self) -> F {
        self.finish(Comparator::IsNull, Vec::new())
    }

    pub fn is_not_null(self) -> F {
        self.finish(Comparator::IsNotNull, Vec::new())
    }

    fn list<V, I>(self, op: Comparator, values: I) -> SqlResult<F>
    where
        V: ColumnValue<T>,
        I: IntoIterator<Item = V>,
    {
        let right: Vec<Operand> = values.into_iter().map(Self::value).collect();
        if right.is_empty() {
            return Err(SqlError::argument("IN list must contain at least one value"));
        }
        Ok(self.finish(op, right))
    }

    /// `left IN (v0,v1,...)`; an empty list is rejected.
    pub fn in_values<V, I>(self, values: I) -> SqlResult<F>
    where
        V: ColumnValue<T>,
        I: IntoIterator<Item = V>,
    {
        self.list(Comparator::In, values)
    }

    /// `left NOT IN (v0,v1,...)`; an empty list is rejected.
    pub fn not_in_values<V, I>(self, values: I) -> SqlResult<F>
    where
        V: ColumnValue<T>,
        I: IntoIterator<Item = V>,
    {
        self.list(Comparator::NotIn, values)
    }

    pub fn between<V: ColumnValue<T>>(self, low: V, high: V) -> F {
        self.finish(
            Comparator::Between,
            vec![Self::value(low), Self::value(high)],
        )
    }

    pub fn not_between<V: ColumnValue<T>>(self, low: V, high: V) -> F {
        self.finish(
            Comparator::NotBetween,
            vec![Self::value(low), Self::value(high)],
        )
    }

    /// `left IN (SELECT ...)`, the sub-select rendered literally on one line.
    pub fn in_subquery<S: Entity>(self, select: &SqlSelect<S>) -> SqlResult<F> {
        let sql = select.inline_sql()?;
        Ok(self.finish(Comparator::In, vec![Operand::Raw(sql)]))
    }

    pub fn not_in_subquery<S: Entity>(self, select: &SqlSelect<S>) -> SqlResult<F> {
        let sql = select.inline_sql()?;
        Ok(self.finish(Comparator::NotIn, vec![Operand::Raw(sql)]))
    }
}
