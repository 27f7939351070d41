//! Predicate fragments.
//!
//! A fragment is a pure function of a [`RenderConfig`]: the same chain can be
//! rendered with or without aliases and with or without live parameters.

use crate::sql::field::SqlField;
use crate::sql::persistent::PersistentList;
use crate::sql::render::{RenderConfig, SqlParameter};
use crate::sql::token::{Token, TokenStream};
use crate::sql::value::SqlValue;

/// Ordered fragments of one predicate.
pub(crate) type ItemChain = PersistentList<FilterItem>;

/// Comparison operators available to predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    IsNull,
    IsNotNull,
    In,
    NotIn,
    Between,
    NotBetween,
}

impl Comparator {
    fn token(self) -> Token {
        match self {
            Comparator::Eq => Token::Eq,
            Comparator::Ne => Token::Ne,
            Comparator::Gt => Token::Gt,
            Comparator::Gte => Token::Gte,
            Comparator::Lt => Token::Lt,
            Comparator::Lte => Token::Lte,
            Comparator::Like => Token::Like,
            Comparator::NotLike => Token::NotLike,
            Comparator::IsNull => Token::IsNull,
            Comparator::IsNotNull => Token::IsNotNull,
            Comparator::In => Token::In,
            Comparator::NotIn => Token::NotIn,
            Comparator::Between => Token::Between,
            Comparator::NotBetween => Token::NotBetween,
        }
    }

    /// Operators of the form `{0} op {1}`.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Comparator::Eq
                | Comparator::Ne
                | Comparator::Gt
                | Comparator::Gte
                | Comparator::Lt
                | Comparator::Lte
                | Comparator::Like
                | Comparator::NotLike
        )
    }
}

/// One positional parameter of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Field(SqlField),
    Value(SqlValue),
    /// Trusted SQL sub-expression, rendered verbatim.
    Raw(String),
}

impl Operand {
    fn render(&self, config: &RenderConfig, params: &mut Vec<SqlParameter>, out: &mut TokenStream) {
        match self {
            Operand::Field(field) => {
                out.append(&field.short_tokens(config.without_aliases));
            }
            Operand::Value(value) if config.without_parameters => {
                out.push(Token::Literal(value.clone()));
            }
            Operand::Value(value) => {
                let name = config.placeholder(params.len());
                params.push(SqlParameter {
                    name: name.clone(),
                    value: value.clone(),
                });
                out.push(Token::Placeholder(name));
            }
            Operand::Raw(sql) => {
                out.push(Token::Raw(sql.clone()));
            }
        }
    }
}

/// `left op right...`, rendered according to the operator's template.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Comparison {
    pub left: Operand,
    pub op: Comparator,
    pub right: Vec<Operand>,
}

impl Comparison {
    fn render(&self, config: &RenderConfig, params: &mut Vec<SqlParameter>, out: &mut TokenStream) {
        self.left.render(config, params, out);
        out.space().push(self.op.token());
        match self.op {
            Comparator::IsNull | Comparator::IsNotNull => {}
            Comparator::In | Comparator::NotIn => {
                out.space().lparen();
                for (i, operand) in self.right.iter().enumerate() {
                    if i > 0 {
                        out.comma();
                    }
                    operand.render(config, params, out);
                }
                out.rparen();
            }
            Comparator::Between | Comparator::NotBetween => {
                for (i, operand) in self.right.iter().enumerate() {
                    if i > 0 {
                        out.space().push(Token::And);
                    }
                    out.space();
                    operand.render(config, params, out);
                }
            }
            _ => {
                for operand in &self.right {
                    out.space();
                    operand.render(config, params, out);
                }
            }
        }
    }
}

/// A single renderable unit of a predicate chain.
#[derive(Debug, Clone)]
pub(crate) enum FilterItem {
    And,
    Or,
    Open,
    Close,
    Comparison(Comparison),
    /// Every fragment of another chain, shared rather than copied.
    Chain(ItemChain),
}

impl FilterItem {
    pub fn render(&self, config: &RenderConfig, params: &mut Vec<SqlParameter>, out: &mut TokenStream) {
        match self {
            FilterItem::And => {
                out.space().push(Token::And).space();
            }
            FilterItem::Or => {
                out.space().push(Token::Or).space();
            }
            FilterItem::Open => {
                out.lparen();
            }
            FilterItem::Close => {
                out.rparen();
            }
            FilterItem::Comparison(comparison) => comparison.render(config, params, out),
            FilterItem::Chain(chain) => render_chain(chain, config, params, out),
        }
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a SqlField>) {
        match self {
            FilterItem::Comparison(comparison) => {
                for operand in std::iter::once(&comparison.left).chain(&comparison.right) {
                    if let Operand::Field(field) = operand {
                        out.push(field);
                    }
                }
            }
            FilterItem::Chain(chain) => {
                for item in chain.to_vec() {
                    item.collect_fields(out);
                }
            }
            FilterItem::And | FilterItem::Or | FilterItem::Open | FilterItem::Close => {}
        }
    }
}

/// Render every fragment of `chain` in order.
pub(crate) fn render_chain(
    chain: &ItemChain,
    config: &RenderConfig,
    params: &mut Vec<SqlParameter>,
    out: &mut TokenStream,
) {
    for item in chain.to_vec() {
        item.render(config, params, out);
    }
}

/// Every field referenced by `chain`, nested chains included.
pub(crate) fn chain_fields(chain: &ItemChain) -> Vec<&SqlField> {
    let mut fields = Vec::new();
    for item in chain.to_vec() {
        item.collect_fields(&mut fields);
    }
    fields
}
