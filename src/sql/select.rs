//! SELECT statement assembly.
//!
//! [`SqlSelect<E>`] is an immutable builder: every call returns a new
//! statement that shares its untouched lists with the receiver. Checks that
//! depend on the whole statement (output aliases against table aliases,
//! columns of a wrapped statement) run when the statement is rendered.
//!
//! Clause order is fixed:
//!
//! ```text
//! SELECT
//!     [DISTINCT] [TOP n] <fields or *>
//! FROM
//!     <Table> <alias>            -- or (\r\n    <inner>\r\n) AS <alias>
//! <KIND> JOIN
//!     <Table> <alias> ON <condition>
//! WHERE
//!     <predicate>
//! GROUP BY
//!     <fields>
//! HAVING
//!     <predicate>
//! ORDER BY
//!     <fields>
//! ```

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use tracing::{trace, warn};

use super::field::SqlField;
use super::filter::{Comparator, Predicate, SqlMultiFilter};
use super::helpers::emit_top;
use super::persistent::PersistentList;
use super::render::{DbParameter, ParametricSql, SqlParameter};
use super::token::{Token, TokenStream};
use crate::error::{SqlError, SqlResult};
use crate::metadata::{Alias, Column, Entity, EntityMeta, MetadataProvider};

// =============================================================================
// Column comparisons (join conditions)
// =============================================================================

/// A column of some entity, without an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    entity: EntityMeta,
    name: &'static str,
}

impl ColumnRef {
    pub(crate) fn new(entity: EntityMeta, name: &'static str) -> Self {
        Self { entity, name }
    }

    pub fn entity(&self) -> EntityMeta {
        self.entity
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// `left op right` between two columns, as built by [`Column::eq_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnComparison {
    left: ColumnRef,
    op: Comparator,
    right: ColumnRef,
}

impl ColumnComparison {
    pub(crate) fn new(left: ColumnRef, op: Comparator, right: ColumnRef) -> Self {
        Self { left, op, right }
    }

    pub fn left(&self) -> ColumnRef {
        self.left
    }

    pub fn op(&self) -> Comparator {
        self.op
    }

    pub fn right(&self) -> ColumnRef {
        self.right
    }
}

// =============================================================================
// Joins
// =============================================================================

/// Type of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    fn token(self) -> Token {
        match self {
            JoinKind::Inner => Token::Inner,
            JoinKind::Left => Token::Left,
            JoinKind::Right => Token::Right,
            JoinKind::Full => Token::Full,
        }
    }
}

impl FromStr for JoinKind {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinKind::Inner),
            "left" | "left outer" => Ok(JoinKind::Left),
            "right" | "right outer" => Ok(JoinKind::Right),
            "full" | "full outer" => Ok(JoinKind::Full),
            other => Err(SqlError::not_supported(format!("join kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: EntityMeta,
    alias: Alias,
    condition: SqlMultiFilter,
}

impl Join {
    /// Conditions are always inlined, whatever the statement's render mode.
    fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.newline()
            .push(self.kind.token())
            .space()
            .push(Token::Join)
            .newline_indent()
            .ident(self.table.table_name())
            .space()
            .ident(self.alias.value())
            .space()
            .push(Token::On)
            .space()
            .push(Token::Raw(self.condition.raw_sql().to_string()));
        ts
    }
}

// =============================================================================
// ORDER BY
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
struct OrderByField {
    field: SqlField,
    order: SortOrder,
}

impl OrderByField {
    fn to_tokens(&self) -> TokenStream {
        let mut ts = self.field.short_tokens(false);
        if self.order == SortOrder::Desc {
            ts.space().push(Token::Desc);
        }
        ts
    }
}

// =============================================================================
// SqlSelect
// =============================================================================

/// SELECT statement over entity `E`.
#[must_use = "builders have no effect until rendered"]
pub struct SqlSelect<E> {
    provider: Arc<MetadataProvider>,
    alias: Alias,
    fields: PersistentList<SqlField>,
    group_by: PersistentList<SqlField>,
    order_by: PersistentList<OrderByField>,
    joins: PersistentList<Join>,
    filter: Option<SqlMultiFilter>,
    having: Option<SqlMultiFilter>,
    distinct: bool,
    top: Option<u32>,
    inner: Option<Arc<SqlSelect<E>>>,
    command: OnceLock<SqlResult<String>>,
    parametric: OnceLock<SqlResult<ParametricSql>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SqlSelect<E> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            alias: self.alias.clone(),
            fields: self.fields.clone(),
            group_by: self.group_by.clone(),
            order_by: self.order_by.clone(),
            joins: self.joins.clone(),
            filter: self.filter.clone(),
            having: self.having.clone(),
            distinct: self.distinct,
            top: self.top,
            inner: self.inner.clone(),
            command: OnceLock::new(),
            parametric: OnceLock::new(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for SqlSelect<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlSelect")
            .field("entity", &type_name::<E>())
            .field("alias", &self.alias)
            .field("fields", &self.fields)
            .field("joins", &self.joins.len())
            .field("distinct", &self.distinct)
            .field("top", &self.top)
            .field("wrapped", &self.inner.is_some())
            .finish_non_exhaustive()
    }
}

impl<E: Entity> SqlSelect<E> {
    /// `SELECT * FROM <E> <alias>` with the alias registered in the process-wide provider.
    pub fn new() -> SqlResult<Self> {
        Self::new_in(MetadataProvider::global())
    }

    /// `SELECT * FROM <E> <alias>` with the alias registered in `provider`.
    pub fn new_in(provider: Arc<MetadataProvider>) -> SqlResult<Self> {
        let alias = provider.alias_for::<E>()?;
        Ok(Self::build(provider, alias, None))
    }

    /// Statement over `E` under an explicit alias.
    pub fn aliased(alias: Alias) -> Self {
        Self::aliased_in(MetadataProvider::global(), alias)
    }

    pub fn aliased_in(provider: Arc<MetadataProvider>, alias: Alias) -> Self {
        Self::build(provider, alias, None)
    }

    fn build(provider: Arc<MetadataProvider>, alias: Alias, inner: Option<Arc<Self>>) -> Self {
        Self {
            provider,
            alias,
            fields: PersistentList::new(),
            group_by: PersistentList::new(),
            order_by: PersistentList::new(),
            joins: PersistentList::new(),
            filter: None,
            having: None,
            distinct: false,
            top: None,
            inner,
            command: OnceLock::new(),
            parametric: OnceLock::new(),
            _entity: PhantomData,
        }
    }

    pub fn alias(&self) -> &Alias {
        &self.alias
    }

    pub fn provider(&self) -> &Arc<MetadataProvider> {
        &self.provider
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn top_count(&self) -> Option<u32> {
        self.top
    }

    /// Statement this one selects from, if wrapped.
    pub fn inner(&self) -> Option<&SqlSelect<E>> {
        self.inner.as_deref()
    }

    // =========================================================================
    // Select list
    // =========================================================================

    /// Column of `E` qualified with this statement's alias.
    pub fn field<T: 'static>(&self, column: Column<E, T>) -> SqlField {
        column.with_alias(&self.alias)
    }

    /// Append a column of `E`.
    pub fn add_field<T: 'static>(&self, column: Column<E, T>) -> Self {
        self.add_fields([self.field(column)])
    }

    /// Append a column of any entity, qualified with the alias it has in this statement.
    pub fn add_column<E2: Entity, T: 'static>(&self, column: Column<E2, T>) -> SqlResult<Self> {
        let field = self.scoped(column)?;
        Ok(self.add_fields([field]))
    }

    /// Append fields as given; their aliases are not rewritten.
    pub fn add_fields(&self, fields: impl IntoIterator<Item = SqlField>) -> Self {
        let mut next = self.clone();
        next.fields = fields
            .into_iter()
            .fold(self.fields.clone(), |list, field| list.push(field));
        next
    }

    // =========================================================================
    // GROUP BY / ORDER BY
    // =========================================================================

    pub fn group_by<T: 'static>(&self, column: Column<E, T>) -> Self {
        self.group_by_fields([self.field(column)])
    }

    pub fn group_by_column<E2: Entity, T: 'static>(&self, column: Column<E2, T>) -> SqlResult<Self> {
        let field = self.scoped(column)?;
        Ok(self.group_by_fields([field]))
    }

    pub fn group_by_fields(&self, fields: impl IntoIterator<Item = SqlField>) -> Self {
        let mut next = self.clone();
        next.group_by = fields
            .into_iter()
            .fold(self.group_by.clone(), |list, field| list.push(field));
        next
    }

    pub fn order_by<T: 'static>(&self, column: Column<E, T>) -> Self {
        self.order_by_field(self.field(column), SortOrder::Asc)
    }

    pub fn order_by_desc<T: 'static>(&self, column: Column<E, T>) -> Self {
        self.order_by_field(self.field(column), SortOrder::Desc)
    }

    /// Append ascending sort keys.
    pub fn order_by_fields(&self, fields: impl IntoIterator<Item = SqlField>) -> Self {
        let mut next = self.clone();
        next.order_by = fields.into_iter().fold(self.order_by.clone(), |list, field| {
            list.push(OrderByField {
                field,
                order: SortOrder::Asc,
            })
        });
        next
    }

    pub fn order_by_field(&self, field: SqlField, order: SortOrder) -> Self {
        let mut next = self.clone();
        next.order_by = self.order_by.push(OrderByField { field, order });
        next
    }

    // =========================================================================
    // Joins
    // =========================================================================

    /// Join entity `J` on an explicit condition. Without `alias`, `J`'s
    /// registered alias is used.
    pub fn join<J: Entity>(
        &self,
        kind: JoinKind,
        condition: &impl Predicate,
        alias: Option<Alias>,
    ) -> SqlResult<Self> {
        let alias = match alias {
            Some(alias) => alias,
            None => self.provider.alias_for::<J>()?,
        };
        self.push_join(Join {
            kind,
            table: EntityMeta::of::<J>(),
            alias,
            condition: condition.to_multi(),
        })
    }

    /// Join on a column equality, in either operand order.
    ///
    /// When `alias` is bound to an entity, the operand of that entity names
    /// the joined table. Otherwise the operand whose entity is already in
    /// scope (this statement's own entity or an earlier join) is the left
    /// side and the other names the joined table; when both are in scope the
    /// first one is the left side.
    pub fn join_on(
        &self,
        kind: JoinKind,
        comparison: ColumnComparison,
        alias: Option<Alias>,
    ) -> SqlResult<Self> {
        let target = alias.as_ref().and_then(Alias::entity);
        self.join_comparison(kind, comparison, alias, target)
    }

    /// Join table `J` on a column equality, in either operand order.
    ///
    /// The operand belonging to `J` names the joined table; on a self-join
    /// the second operand does.
    pub fn join_to<J: Entity>(
        &self,
        kind: JoinKind,
        comparison: ColumnComparison,
        alias: Option<Alias>,
    ) -> SqlResult<Self> {
        self.join_comparison(kind, comparison, alias, Some(EntityMeta::of::<J>()))
    }

    fn join_comparison(
        &self,
        kind: JoinKind,
        comparison: ColumnComparison,
        alias: Option<Alias>,
        target: Option<EntityMeta>,
    ) -> SqlResult<Self> {
        if comparison.op() != Comparator::Eq {
            return Err(SqlError::not_supported(format!(
                "join condition with {:?}; only equality is supported",
                comparison.op()
            )));
        }

        let (left, right) = match target {
            Some(target) if comparison.right().entity() == target => {
                (comparison.left(), comparison.right())
            }
            Some(target) if comparison.left().entity() == target => {
                (comparison.right(), comparison.left())
            }
            Some(target) => {
                return Err(SqlError::not_supported(format!(
                    "join condition between '{}' and '{}' does not reference '{}'",
                    comparison.left().entity().type_name(),
                    comparison.right().entity().type_name(),
                    target.type_name()
                )));
            }
            None if self.alias_in_scope(comparison.left().entity()).is_some() => {
                (comparison.left(), comparison.right())
            }
            None => (comparison.right(), comparison.left()),
        };
        let Some(left_alias) = self.alias_in_scope(left.entity()) else {
            return Err(SqlError::not_supported(format!(
                "join condition between '{}' and '{}' references no table of this statement",
                comparison.left().entity().type_name(),
                comparison.right().entity().type_name()
            )));
        };

        let right_alias = match alias {
            Some(alias) => alias,
            None => self.provider.alias_of(right.entity())?,
        };
        let left_field =
            SqlField::new_in(&self.provider, left.entity(), Some(left_alias), left.name())?;
        let right_field = SqlField::new_in(
            &self.provider,
            right.entity(),
            Some(right_alias.clone()),
            right.name(),
        )?;
        let condition = SqlMultiFilter::new_in(self.provider.clone())
            .and_field(left_field)
            .equal_to_field(right_field);

        self.push_join(Join {
            kind,
            table: right.entity(),
            alias: right_alias,
            condition,
        })
    }

    pub fn inner_join(&self, comparison: ColumnComparison) -> SqlResult<Self> {
        self.join_on(JoinKind::Inner, comparison, None)
    }

    pub fn left_join(&self, comparison: ColumnComparison) -> SqlResult<Self> {
        self.join_on(JoinKind::Left, comparison, None)
    }

    pub fn right_join(&self, comparison: ColumnComparison) -> SqlResult<Self> {
        self.join_on(JoinKind::Right, comparison, None)
    }

    pub fn full_join(&self, comparison: ColumnComparison) -> SqlResult<Self> {
        self.join_on(JoinKind::Full, comparison, None)
    }

    fn push_join(&self, join: Join) -> SqlResult<Self> {
        let joins = self.joins.to_vec();
        let taken = std::iter::once(&self.alias)
            .chain(joins.iter().map(|existing| &existing.alias))
            .any(|alias| *alias == join.alias);
        if taken {
            return Err(SqlError::DuplicateJoinAlias {
                alias: join.alias.value().to_string(),
            });
        }
        let mut next = self.clone();
        next.joins = self.joins.push(join);
        Ok(next)
    }

    // =========================================================================
    // Predicates and modifiers
    // =========================================================================

    /// Set the `WHERE` predicate, replacing any previous one. An empty
    /// predicate removes the clause.
    pub fn filter(&self, predicate: &impl Predicate) -> Self {
        let mut next = self.clone();
        next.filter = Some(predicate.to_multi()).filter(|p| !p.is_empty());
        next
    }

    /// Set the `HAVING` predicate, replacing any previous one.
    pub fn having(&self, predicate: &impl Predicate) -> Self {
        let mut next = self.clone();
        next.having = Some(predicate.to_multi()).filter(|p| !p.is_empty());
        next
    }

    pub fn distinct(&self, distinct: bool) -> Self {
        let mut next = self.clone();
        next.distinct = distinct;
        next
    }

    /// Limit to the first `count` rows; zero is rejected.
    pub fn top(&self, count: u32) -> SqlResult<Self> {
        if count < 1 {
            return Err(SqlError::argument("TOP count must be at least 1"));
        }
        let mut next = self.clone();
        next.top = Some(count);
        Ok(next)
    }

    /// Select from this statement, keeping its alias for the derived table.
    pub fn wrap(&self) -> Self {
        self.wrap_as(self.alias.clone())
    }

    /// Select from this statement as a derived table named `alias`.
    pub fn wrap_as(&self, alias: Alias) -> Self {
        Self::build(self.provider.clone(), alias, Some(Arc::new(self.clone())))
    }

    // =========================================================================
    // Scope
    // =========================================================================

    /// Entities whose columns this statement can expose.
    fn scope_entities(&self) -> Vec<EntityMeta> {
        let mut entities = match &self.inner {
            Some(inner) => inner.scope_entities(),
            None => vec![EntityMeta::of::<E>()],
        };
        entities.extend(self.joins.to_vec().into_iter().map(|join| join.table));
        entities
    }

    /// Alias under which `entity`'s columns are visible in this statement.
    fn alias_in_scope(&self, entity: EntityMeta) -> Option<Alias> {
        if entity.is::<E>() {
            return Some(self.alias.clone());
        }
        if let Some(join) = self.joins.to_vec().into_iter().find(|join| join.table == entity) {
            return Some(join.alias.clone());
        }
        self.inner
            .as_ref()
            .filter(|inner| inner.scope_entities().contains(&entity))
            .map(|_| self.alias.clone())
    }

    fn scoped<E2: Entity, T: 'static>(&self, column: Column<E2, T>) -> SqlResult<SqlField> {
        match self.alias_in_scope(column.entity()) {
            Some(alias) => Ok(column.with_alias(&alias)),
            None => column.resolve_in(&self.provider),
        }
    }

    /// Whether an outer statement may reference `field` from this one.
    fn exposes(&self, field: &SqlField) -> bool {
        if self.fields.is_empty() {
            return self.scope_entities().contains(&field.entity());
        }
        self.fields
            .to_vec()
            .iter()
            .any(|own| own.entity() == field.entity() && own.exposed_name() == field.name())
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn validate(&self) -> SqlResult<()> {
        let fields = self.fields.to_vec();
        let group_by = self.group_by.to_vec();
        let order_by = self.order_by.to_vec();
        let joins = self.joins.to_vec();

        let listed = || {
            fields
                .iter()
                .copied()
                .chain(group_by.iter().copied())
                .chain(order_by.iter().copied().map(|order| &order.field))
        };

        if let Some(inner) = &self.inner {
            let predicates = self
                .filter
                .iter()
                .chain(self.having.iter())
                .flat_map(|predicate| predicate.fields());
            let joined = |field: &SqlField| {
                field
                    .alias()
                    .is_some_and(|alias| joins.iter().any(|join| &join.alias == alias))
            };
            for field in listed().chain(predicates) {
                if !joined(field) && !inner.exposes(field) {
                    return Err(SqlError::UnknownInnerField {
                        field: format!("{}.{}", field.entity().type_name(), field.name()),
                    });
                }
            }
        }

        let table_aliases: Vec<&str> = std::iter::once(self.alias.value())
            .chain(joins.iter().map(|join| join.alias.value()))
            .collect();
        let mut colliding: Vec<String> = Vec::new();
        for output in listed().filter_map(SqlField::output_alias) {
            if let Some(alias) = table_aliases
                .iter()
                .find(|alias| alias.eq_ignore_ascii_case(output))
            {
                if !colliding.iter().any(|seen| seen == alias) {
                    colliding.push(alias.to_string());
                }
            }
        }
        if !colliding.is_empty() {
            return Err(SqlError::IncorrectAlias { aliases: colliding });
        }
        Ok(())
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Statement tokens. Placeholders continue the numbering in `params`;
    /// a wrapped statement's parameters come first.
    fn to_tokens(
        &self,
        without_parameters: bool,
        params: &mut Vec<SqlParameter>,
    ) -> SqlResult<TokenStream> {
        self.validate()?;

        let mut ts = TokenStream::new();
        ts.push(Token::Select).newline_indent();
        if self.distinct {
            ts.push(Token::Distinct).space();
        }
        if let Some(count) = self.top {
            ts.append(&emit_top(count)).space();
        }
        if self.fields.is_empty() {
            ts.push(Token::Star);
        }
        for (i, field) in self.fields.to_vec().iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.append(&field.full_tokens(false));
        }

        ts.newline().push(Token::From);
        match &self.inner {
            Some(inner) => {
                let nested = inner.to_tokens(without_parameters, params)?;
                ts.newline()
                    .lparen()
                    .newline_indent()
                    .push(Token::Nested(nested))
                    .newline()
                    .rparen()
                    .space()
                    .push(Token::As)
                    .space()
                    .ident(self.alias.value());
            }
            None => {
                ts.newline_indent()
                    .ident(E::table_name())
                    .space()
                    .ident(self.alias.value());
            }
        }

        for join in self.joins.to_vec() {
            ts.append(&join.to_tokens());
        }

        if let Some(filter) = &self.filter {
            let predicate = filter.render_into(without_parameters, params);
            ts.newline().push(Token::Where).newline_indent().append(&predicate);
        }

        if !self.group_by.is_empty() {
            ts.newline().push(Token::GroupBy).newline_indent();
            for (i, field) in self.group_by.to_vec().iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&field.short_tokens(false));
            }
        }

        if let Some(having) = &self.having {
            let predicate = having.render_into(without_parameters, params);
            ts.newline().push(Token::Having).newline_indent().append(&predicate);
        }

        if !self.order_by.is_empty() {
            ts.newline().push(Token::OrderBy).newline_indent();
            for (i, order) in self.order_by.to_vec().iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&order.to_tokens());
            }
        }

        Ok(ts)
    }

    fn render(&self, without_parameters: bool) -> SqlResult<ParametricSql> {
        let mut parameters = Vec::new();
        let tokens = self
            .to_tokens(without_parameters, &mut parameters)
            .inspect_err(|err| {
                warn!(entity = type_name::<E>(), error = %err, "statement failed validation");
            })?;
        Ok(ParametricSql {
            text: tokens.serialize(),
            parameters,
        })
    }

    /// Statement with values inlined as literals.
    pub fn command_text(&self) -> SqlResult<&str> {
        self.command
            .get_or_init(|| {
                let text = self.render(true).map(|rendered| rendered.text);
                trace!(entity = type_name::<E>(), ok = text.is_ok(), "rendered statement");
                text
            })
            .as_deref()
            .map_err(|err| err.clone())
    }

    /// Same text as [`command_text`](Self::command_text).
    pub fn raw_sql(&self) -> SqlResult<&str> {
        self.command_text()
    }

    /// Statement text and parameters, computed by one walk.
    pub fn parametric(&self) -> SqlResult<&ParametricSql> {
        self.parametric
            .get_or_init(|| {
                let rendered = self.render(false);
                trace!(
                    entity = type_name::<E>(),
                    ok = rendered.is_ok(),
                    "rendered parametric statement"
                );
                rendered
            })
            .as_ref()
            .map_err(|err| err.clone())
    }

    /// Statement with values replaced by placeholders.
    pub fn parametric_sql(&self) -> SqlResult<&str> {
        self.parametric().map(|rendered| rendered.text.as_str())
    }

    /// Parameters of [`parametric_sql`](Self::parametric_sql): wrapped
    /// statement first, then `WHERE`, then `HAVING`.
    pub fn parameters(&self) -> SqlResult<&[SqlParameter]> {
        self.parametric().map(|rendered| rendered.parameters.as_slice())
    }

    pub fn parameters_as<P: DbParameter>(&self) -> SqlResult<Vec<P>> {
        self.parametric().map(ParametricSql::parameters_as)
    }

    /// Literal rendering on one line, for use as a sub-expression.
    pub(crate) fn inline_sql(&self) -> SqlResult<String> {
        Ok(self.to_tokens(true, &mut Vec::new())?.serialize_inline())
    }
}
