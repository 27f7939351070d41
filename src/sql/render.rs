//! Rendering configuration and parameter output.

use std::sync::Arc;

use super::value::SqlValue;

/// Controls one rendering pass over a predicate chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Drop every `alias.` qualifier.
    pub without_aliases: bool,
    /// Inline values as literals instead of emitting placeholders.
    pub without_parameters: bool,
    /// Placeholder prefix (`@{prefix}{n}`).
    pub parameter_prefix: Arc<str>,
}

/// Whether `prefix` can follow `@` in a placeholder name.
pub fn is_parameter_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl RenderConfig {
    /// Placeholder name for the `index`-th parameter of a statement.
    pub fn placeholder(&self, index: usize) -> String {
        format!("@{}{}", self.parameter_prefix, index)
    }
}

/// A named parameter produced by parametric rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParameter {
    pub name: String,
    pub value: SqlValue,
}

/// Parameter container of a database client.
///
/// Rendering only ever sets the name and the value.
pub trait DbParameter: Default {
    fn set_name(&mut self, name: &str);
    fn set_value(&mut self, value: &SqlValue);
}

impl DbParameter for SqlParameter {
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn set_value(&mut self, value: &SqlValue) {
        self.value = value.clone();
    }
}

impl Default for SqlParameter {
    fn default() -> Self {
        Self {
            name: String::new(),
            value: SqlValue::Null,
        }
    }
}

/// Convert rendered parameters into a client's parameter type.
pub fn convert_parameters<P: DbParameter>(parameters: &[SqlParameter]) -> Vec<P> {
    parameters
        .iter()
        .map(|parameter| {
            let mut target = P::default();
            target.set_name(&parameter.name);
            target.set_value(&parameter.value);
            target
        })
        .collect()
}

/// Parameterized statement text with its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricSql {
    pub text: String,
    pub parameters: Vec<SqlParameter>,
}

impl ParametricSql {
    /// Parameters converted into a client's parameter type.
    pub fn parameters_as<P: DbParameter>(&self) -> Vec<P> {
        convert_parameters(&self.parameters)
    }
}
