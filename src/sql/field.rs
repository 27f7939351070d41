//! Column references with optional aggregate and output alias.

use std::any::{type_name, TypeId};
use std::fmt;

use super::token::{Token, TokenStream};
use crate::error::{SqlError, SqlResult};
use crate::metadata::{Alias, Entity, EntityMeta, MetadataProvider};

/// Aggregate function wrapped around a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Min,
    Max,
    Avg,
    Sum,
    Count,
    CountDistinct,
}

impl Aggregate {
    pub fn function_name(self) -> &'static str {
        match self {
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
            Aggregate::Avg => "AVG",
            Aggregate::Sum => "SUM",
            Aggregate::Count | Aggregate::CountDistinct => "COUNT",
        }
    }
}

/// Declared value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
    type_id: TypeId,
    type_name: &'static str,
}

impl FieldType {
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// A reference to a column, as rendered in select lists and predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlField {
    entity: EntityMeta,
    field_type: Option<FieldType>,
    name: String,
    alias: Option<Alias>,
    output_alias: Option<String>,
    aggregate: Option<Aggregate>,
}

impl SqlField {
    /// Field of `entity`; without an explicit alias the process-wide provider resolves one.
    pub fn new(entity: EntityMeta, alias: Option<Alias>, name: &str) -> SqlResult<Self> {
        Self::new_in(&MetadataProvider::global(), entity, alias, name)
    }

    /// Field of `entity`; without an explicit alias `provider` resolves one.
    pub fn new_in(
        provider: &MetadataProvider,
        entity: EntityMeta,
        alias: Option<Alias>,
        name: &str,
    ) -> SqlResult<Self> {
        if name.trim().is_empty() {
            return Err(SqlError::argument("field name must not be empty"));
        }
        let alias = match alias {
            Some(alias) => alias,
            None => provider.alias_of(entity)?,
        };
        Ok(Self {
            entity,
            field_type: None,
            name: name.to_string(),
            alias: Some(alias),
            output_alias: None,
            aggregate: None,
        })
    }

    /// Field of entity `E`.
    pub fn of<E: Entity>(alias: Option<Alias>, name: &str) -> SqlResult<Self> {
        Self::new(EntityMeta::of::<E>(), alias, name)
    }

    pub(crate) fn typed(
        entity: EntityMeta,
        field_type: FieldType,
        alias: Option<Alias>,
        name: &str,
    ) -> Self {
        Self {
            entity,
            field_type: Some(field_type),
            name: name.to_string(),
            alias,
            output_alias: None,
            aggregate: None,
        }
    }

    pub fn entity(&self) -> EntityMeta {
        self.entity
    }

    pub fn field_type(&self) -> Option<FieldType> {
        self.field_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&Alias> {
        self.alias.as_ref()
    }

    pub fn output_alias(&self) -> Option<&str> {
        self.output_alias.as_deref()
    }

    pub fn aggregate(&self) -> Option<Aggregate> {
        self.aggregate
    }

    /// Name under which the column is visible to an enclosing statement.
    pub fn exposed_name(&self) -> &str {
        self.output_alias.as_deref().unwrap_or(&self.name)
    }

    // =========================================================================
    // Derived fields
    // =========================================================================

    /// Render `AS name` after the field. An empty name clears the output alias.
    #[must_use]
    pub fn with_output_alias(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.output_alias = if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
        self
    }

    /// Same column qualified with another alias.
    #[must_use]
    pub fn with_alias(&self, alias: Alias) -> Self {
        let mut field = self.clone();
        field.alias = Some(alias);
        field
    }

    /// Same column with no alias qualifier.
    #[must_use]
    pub fn without_alias(&self) -> Self {
        let mut field = self.clone();
        field.alias = None;
        field
    }

    #[must_use]
    pub fn aggregate_with(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    #[must_use]
    pub fn min(self) -> Self {
        self.aggregate_with(Aggregate::Min)
    }

    #[must_use]
    pub fn max(self) -> Self {
        self.aggregate_with(Aggregate::Max)
    }

    #[must_use]
    pub fn avg(self) -> Self {
        self.aggregate_with(Aggregate::Avg)
    }

    #[must_use]
    pub fn sum(self) -> Self {
        self.aggregate_with(Aggregate::Sum)
    }

    #[must_use]
    pub fn count(self) -> Self {
        self.aggregate_with(Aggregate::Count)
    }

    #[must_use]
    pub fn count_distinct(self) -> Self {
        self.aggregate_with(Aggregate::CountDistinct)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// `alias.Name`, aggregate-wrapped when tagged.
    pub fn short_tokens(&self, without_alias: bool) -> TokenStream {
        let mut column = TokenStream::new();
        if let Some(alias) = self.alias.as_ref().filter(|_| !without_alias) {
            column.ident(alias.value()).push(Token::Dot);
        }
        column.ident(&self.name);

        let Some(aggregate) = self.aggregate else {
            return column;
        };
        let mut ts = TokenStream::new();
        ts.push(Token::FunctionName(aggregate.function_name())).lparen();
        if aggregate == Aggregate::CountDistinct {
            ts.push(Token::Distinct).space();
        }
        ts.append(&column).rparen();
        ts
    }

    /// Short form followed by `AS outputAlias` when one is set.
    pub fn full_tokens(&self, without_alias: bool) -> TokenStream {
        let mut ts = self.short_tokens(without_alias);
        if let Some(output) = &self.output_alias {
            ts.space().push(Token::As).space().ident(output);
        }
        ts
    }

    pub fn short_render(&self, without_alias: bool) -> String {
        self.short_tokens(without_alias).serialize()
    }

    pub fn full_render(&self, without_alias: bool) -> String {
        self.full_tokens(without_alias).serialize()
    }
}

impl fmt::Display for SqlField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_render(false))
    }
}
