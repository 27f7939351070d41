//! Immutable predicate builders.
//!
//! Every fluent call returns a new filter with one more fragment appended;
//! the receiver never changes, and the fragments it already holds are shared
//! with the new version.
//!
//! - [`SqlFilter<E>`] - predicate over a single entity; comparisons against
//!   columns of `E` are type-checked.
//! - [`SqlMultiFilter`] - predicate spanning several entities. A typed filter
//!   becomes a multi-entity filter as soon as a column of another entity is
//!   added to it.
//!
//! ```ignore
//! let filter = SqlFilter::of(Person::ID)?
//!     .equal_to(5)
//!     .and(Person::NAME)?
//!     .equal_to("x");
//! assert_eq!(filter.raw_sql(), "pe.Id = 5 AND pe.Name = 'x'");
//! ```

mod condition;
mod item;

pub use condition::Condition;
pub use item::Comparator;

pub(crate) use item::{FilterItem, Operand};

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use tracing::trace;

use self::item::{chain_fields, render_chain, ItemChain};
use super::field::SqlField;
use super::render::{is_parameter_prefix, DbParameter, ParametricSql, RenderConfig, SqlParameter};
use super::token::TokenStream;
use super::value::AnyValue;
use crate::error::{SqlError, SqlResult};
use crate::metadata::{Column, Entity, MetadataProvider};

mod private {
    pub trait Sealed {
        fn from_multi(filter: super::SqlMultiFilter) -> Self;
    }
}

/// Filter types a pending [`Condition`] can complete into.
pub trait FilterKind: private::Sealed {}

/// Anything usable as a `WHERE`/`HAVING`/`ON` predicate or as a group.
pub trait Predicate {
    /// Type-erased view of the predicate.
    fn to_multi(&self) -> SqlMultiFilter;
}

// =============================================================================
// Multi-entity filter
// =============================================================================

/// Predicate whose fragments may reference any number of entities.
#[derive(Debug, Clone)]
pub struct SqlMultiFilter {
    chain: ItemChain,
    hide_aliases: bool,
    parameter_prefix: Arc<str>,
    provider: Arc<MetadataProvider>,
    raw: OnceLock<String>,
    parametric: OnceLock<ParametricSql>,
}

impl Default for SqlMultiFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlMultiFilter {
    /// Empty filter bound to the process-wide provider.
    pub fn new() -> Self {
        Self::new_in(MetadataProvider::global())
    }

    /// Empty filter bound to `provider`.
    pub fn new_in(provider: Arc<MetadataProvider>) -> Self {
        Self {
            chain: ItemChain::new(),
            hide_aliases: false,
            parameter_prefix: provider.shared_prefix(),
            provider,
            raw: OnceLock::new(),
            parametric: OnceLock::new(),
        }
    }

    /// Start a predicate on an arbitrary field.
    pub fn field(field: SqlField) -> Condition<SqlMultiFilter, AnyValue> {
        Self::new().and_field(field)
    }

    pub fn provider(&self) -> &Arc<MetadataProvider> {
        &self.provider
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Same settings, different fragments, fresh caches.
    fn with_chain(&self, chain: ItemChain) -> Self {
        Self {
            chain,
            hide_aliases: self.hide_aliases,
            parameter_prefix: self.parameter_prefix.clone(),
            provider: self.provider.clone(),
            raw: OnceLock::new(),
            parametric: OnceLock::new(),
        }
    }

    pub(crate) fn push(&self, item: FilterItem) -> Self {
        self.with_chain(self.chain.push(item))
    }

    /// Append `connective` unless this is the first fragment.
    fn connect(&self, connective: FilterItem) -> Self {
        if self.chain.is_empty() {
            self.with_chain(self.chain.clone())
        } else {
            self.push(connective)
        }
    }

    pub(crate) fn begin<F, T>(&self, connective: FilterItem, left: Operand) -> Condition<F, T> {
        Condition::new(self.connect(connective), left)
    }

    fn group(&self, connective: FilterItem, other: &SqlMultiFilter) -> Self {
        if other.chain.is_empty() {
            return self.with_chain(self.chain.clone());
        }
        let chain = self
            .connect(connective)
            .chain
            .push(FilterItem::Open)
            .push(FilterItem::Chain(other.chain.clone()))
            .push(FilterItem::Close);
        self.with_chain(chain)
    }

    // =========================================================================
    // Composition
    // =========================================================================

    pub fn and_field(&self, field: SqlField) -> Condition<SqlMultiFilter, AnyValue> {
        self.begin(FilterItem::And, Operand::Field(field))
    }

    pub fn or_field(&self, field: SqlField) -> Condition<SqlMultiFilter, AnyValue> {
        self.begin(FilterItem::Or, Operand::Field(field))
    }

    /// `AND` a column of any entity, qualified with its registered alias.
    pub fn and_column<E: Entity, T: 'static>(
        &self,
        column: Column<E, T>,
    ) -> SqlResult<Condition<SqlMultiFilter, T>> {
        let field = column.resolve_in(&self.provider)?;
        Ok(self.begin(FilterItem::And, Operand::Field(field)))
    }

    /// `OR` a column of any entity, qualified with its registered alias.
    pub fn or_column<E: Entity, T: 'static>(
        &self,
        column: Column<E, T>,
    ) -> SqlResult<Condition<SqlMultiFilter, T>> {
        let field = column.resolve_in(&self.provider)?;
        Ok(self.begin(FilterItem::Or, Operand::Field(field)))
    }

    /// `<self> AND (<other>)`.
    pub fn and_group(&self, other: &impl Predicate) -> Self {
        self.group(FilterItem::And, &other.to_multi())
    }

    /// `<self> OR (<other>)`.
    pub fn or_group(&self, other: &impl Predicate) -> Self {
        self.group(FilterItem::Or, &other.to_multi())
    }

    // =========================================================================
    // Render settings
    // =========================================================================

    /// Same predicate rendered without `alias.` qualifiers.
    pub fn without_aliases(&self) -> Self {
        let mut filter = self.with_chain(self.chain.clone());
        filter.hide_aliases = true;
        filter
    }

    /// Same predicate rendered with `alias.` qualifiers.
    pub fn with_aliases(&self) -> Self {
        let mut filter = self.with_chain(self.chain.clone());
        filter.hide_aliases = false;
        filter
    }

    /// Same predicate with placeholders named `@{prefix}{n}`.
    ///
    /// The prefix must be a non-empty run of ASCII letters, digits or `_`.
    pub fn with_parameter_prefix(&self, prefix: &str) -> SqlResult<Self> {
        if !is_parameter_prefix(prefix) {
            return Err(SqlError::argument(format!(
                "parameter prefix must be a non-empty identifier, got '{prefix}'"
            )));
        }
        let mut filter = self.with_chain(self.chain.clone());
        filter.parameter_prefix = Arc::from(prefix);
        Ok(filter)
    }

    pub fn parameter_prefix(&self) -> &str {
        &self.parameter_prefix
    }

    pub fn aliases_hidden(&self) -> bool {
        self.hide_aliases
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    fn config(&self, without_parameters: bool) -> RenderConfig {
        RenderConfig {
            without_aliases: self.hide_aliases,
            without_parameters,
            parameter_prefix: self.parameter_prefix.clone(),
        }
    }

    /// Render into tokens, numbering placeholders after those already in `params`.
    pub(crate) fn render_into(
        &self,
        without_parameters: bool,
        params: &mut Vec<SqlParameter>,
    ) -> TokenStream {
        let mut out = TokenStream::new();
        render_chain(&self.chain, &self.config(without_parameters), params, &mut out);
        out
    }

    /// Every field the predicate references.
    pub(crate) fn fields(&self) -> Vec<&SqlField> {
        chain_fields(&self.chain)
    }

    /// Predicate with values inlined as literals.
    pub fn raw_sql(&self) -> &str {
        self.raw.get_or_init(|| {
            let text = self.render_into(true, &mut Vec::new()).serialize();
            trace!(sql = %text, "rendered raw predicate");
            text
        })
    }

    /// Predicate text and parameters, computed by one walk.
    pub fn parametric(&self) -> &ParametricSql {
        self.parametric.get_or_init(|| {
            let mut parameters = Vec::new();
            let text = self.render_into(false, &mut parameters).serialize();
            trace!(sql = %text, parameters = parameters.len(), "rendered parametric predicate");
            ParametricSql { text, parameters }
        })
    }

    /// Predicate with values replaced by placeholders.
    pub fn parametric_sql(&self) -> &str {
        &self.parametric().text
    }

    /// Parameters matching [`parametric_sql`](Self::parametric_sql), in placeholder order.
    pub fn parameters(&self) -> &[SqlParameter] {
        &self.parametric().parameters
    }

    /// Parameters converted into a client's parameter type.
    pub fn parameters_as<P: DbParameter>(&self) -> Vec<P> {
        self.parametric().parameters_as()
    }
}

impl private::Sealed for SqlMultiFilter {
    fn from_multi(filter: SqlMultiFilter) -> Self {
        filter
    }
}

impl FilterKind for SqlMultiFilter {}

impl Predicate for SqlMultiFilter {
    fn to_multi(&self) -> SqlMultiFilter {
        self.clone()
    }
}

impl fmt::Display for SqlMultiFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw_sql())
    }
}

// =============================================================================
// Single-entity filter
// =============================================================================

/// Predicate over columns of entity `E`.
pub struct SqlFilter<E> {
    inner: SqlMultiFilter,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SqlFilter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for SqlFilter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlFilter")
            .field("entity", &std::any::type_name::<E>())
            .field("chain", &self.inner.chain)
            .finish()
    }
}

impl<E: Entity> Default for SqlFilter<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a type-erased field against the generic parameters in force.
fn assert_field_matches<E: Entity, T: 'static>(field: &SqlField) {
    debug_assert!(
        field.entity().is::<E>(),
        "field '{}' belongs to '{}', not '{}'",
        field.name(),
        field.entity().type_name(),
        std::any::type_name::<E>()
    );
    debug_assert!(
        field.field_type().map_or(true, |declared| declared.is::<T>()),
        "field '{}' is declared as '{}', not '{}'",
        field.name(),
        field.field_type().map_or("?", |declared| declared.type_name()),
        std::any::type_name::<T>()
    );
}

impl<E: Entity> SqlFilter<E> {
    fn wrap(inner: SqlMultiFilter) -> Self {
        Self {
            inner,
            _entity: PhantomData,
        }
    }

    /// Empty filter bound to the process-wide provider.
    pub fn new() -> Self {
        Self::wrap(SqlMultiFilter::new())
    }

    /// Empty filter bound to `provider`.
    pub fn new_in(provider: Arc<MetadataProvider>) -> Self {
        Self::wrap(SqlMultiFilter::new_in(provider))
    }

    /// Start a predicate on `column`.
    pub fn of<T: 'static>(column: Column<E, T>) -> SqlResult<Condition<Self, T>> {
        Self::new().and(column)
    }

    /// Start a predicate on `column`, resolving aliases through `provider`.
    pub fn of_in<T: 'static>(
        provider: Arc<MetadataProvider>,
        column: Column<E, T>,
    ) -> SqlResult<Condition<Self, T>> {
        Self::new_in(provider).and(column)
    }

    /// Start a predicate on a type-erased field declared for `E` and `T`.
    ///
    /// A field of another entity or value type is a programming error and
    /// fails a debug assertion.
    pub fn of_field<T: 'static>(field: SqlField) -> Condition<Self, T> {
        Self::new().and_typed(field)
    }

    /// Start a predicate on a trusted SQL sub-expression.
    pub fn raw(expression: impl Into<String>) -> Condition<Self, AnyValue> {
        Self::new().raw_operand(expression.into())
    }

    /// Start a predicate on a trusted SQL sub-expression, rendered with
    /// `provider`'s parameter prefix.
    pub fn raw_in(
        provider: Arc<MetadataProvider>,
        expression: impl Into<String>,
    ) -> Condition<Self, AnyValue> {
        Self::new_in(provider).raw_operand(expression.into())
    }

    fn raw_operand(&self, expression: String) -> Condition<Self, AnyValue> {
        self.inner.begin(FilterItem::And, Operand::Raw(expression))
    }

    pub fn provider(&self) -> &Arc<MetadataProvider> {
        self.inner.provider()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop the entity type.
    pub fn into_multi(self) -> SqlMultiFilter {
        self.inner
    }

    // =========================================================================
    // Composition
    // =========================================================================

    pub fn and<T: 'static>(&self, column: Column<E, T>) -> SqlResult<Condition<Self, T>> {
        let field = column.resolve_in(self.provider())?;
        Ok(self.inner.begin(FilterItem::And, Operand::Field(field)))
    }

    pub fn or<T: 'static>(&self, column: Column<E, T>) -> SqlResult<Condition<Self, T>> {
        let field = column.resolve_in(self.provider())?;
        Ok(self.inner.begin(FilterItem::Or, Operand::Field(field)))
    }

    /// `AND` a type-erased field declared for `E` and `T`.
    pub fn and_typed<T: 'static>(&self, field: SqlField) -> Condition<Self, T> {
        assert_field_matches::<E, T>(&field);
        self.inner.begin(FilterItem::And, Operand::Field(field))
    }

    /// `OR` a type-erased field declared for `E` and `T`.
    pub fn or_typed<T: 'static>(&self, field: SqlField) -> Condition<Self, T> {
        assert_field_matches::<E, T>(&field);
        self.inner.begin(FilterItem::Or, Operand::Field(field))
    }

    /// `AND` a field of any entity; the result spans several entities.
    pub fn and_field(&self, field: SqlField) -> Condition<SqlMultiFilter, AnyValue> {
        self.inner.and_field(field)
    }

    /// `OR` a field of any entity; the result spans several entities.
    pub fn or_field(&self, field: SqlField) -> Condition<SqlMultiFilter, AnyValue> {
        self.inner.or_field(field)
    }

    /// `AND` a column of another entity; the result spans several entities.
    pub fn and_column<E2: Entity, T: 'static>(
        &self,
        column: Column<E2, T>,
    ) -> SqlResult<Condition<SqlMultiFilter, T>> {
        self.inner.and_column(column)
    }

    /// `OR` a column of another entity; the result spans several entities.
    pub fn or_column<E2: Entity, T: 'static>(
        &self,
        column: Column<E2, T>,
    ) -> SqlResult<Condition<SqlMultiFilter, T>> {
        self.inner.or_column(column)
    }

    /// `<self> AND (<other>)`.
    pub fn and_group(&self, other: &SqlFilter<E>) -> Self {
        Self::wrap(self.inner.group(FilterItem::And, &other.inner))
    }

    /// `<self> OR (<other>)`.
    pub fn or_group(&self, other: &SqlFilter<E>) -> Self {
        Self::wrap(self.inner.group(FilterItem::Or, &other.inner))
    }

    /// `<self> AND (<other>)` where `other` may span other entities.
    pub fn and_group_any(&self, other: &impl Predicate) -> SqlMultiFilter {
        self.inner.and_group(other)
    }

    /// `<self> OR (<other>)` where `other` may span other entities.
    pub fn or_group_any(&self, other: &impl Predicate) -> SqlMultiFilter {
        self.inner.or_group(other)
    }

    // =========================================================================
    // Render settings
    // =========================================================================

    pub fn without_aliases(&self) -> Self {
        Self::wrap(self.inner.without_aliases())
    }

    pub fn with_aliases(&self) -> Self {
        Self::wrap(self.inner.with_aliases())
    }

    pub fn with_parameter_prefix(&self, prefix: &str) -> SqlResult<Self> {
        self.inner.with_parameter_prefix(prefix).map(Self::wrap)
    }

    pub fn parameter_prefix(&self) -> &str {
        self.inner.parameter_prefix()
    }

    pub fn aliases_hidden(&self) -> bool {
        self.inner.aliases_hidden()
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    pub fn raw_sql(&self) -> &str {
        self.inner.raw_sql()
    }

    pub fn parametric(&self) -> &ParametricSql {
        self.inner.parametric()
    }

    pub fn parametric_sql(&self) -> &str {
        self.inner.parametric_sql()
    }

    pub fn parameters(&self) -> &[SqlParameter] {
        self.inner.parameters()
    }

    pub fn parameters_as<P: DbParameter>(&self) -> Vec<P> {
        self.inner.parameters_as()
    }
}

impl<E: Entity> private::Sealed for SqlFilter<E> {
    fn from_multi(filter: SqlMultiFilter) -> Self {
        Self::wrap(filter)
    }
}

impl<E: Entity> FilterKind for SqlFilter<E> {}

impl<E: Entity> Predicate for SqlFilter<E> {
    fn to_multi(&self) -> SqlMultiFilter {
        self.inner.clone()
    }
}

impl<E: Entity> From<SqlFilter<E>> for SqlMultiFilter {
    fn from(filter: SqlFilter<E>) -> Self {
        filter.inner
    }
}

impl<E: Entity> fmt::Display for SqlFilter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw_sql())
    }
}
