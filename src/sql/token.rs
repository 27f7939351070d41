//! SQL Tokens - the atomic units of rendered statements.
//!
//! Line breaks come in two flavors: `Newline` starts a line at the current
//! nesting depth, `NewlineIndent` starts a line one level deeper. A
//! `Nested` stream is serialized one level deeper than its parent, which is
//! how wrapped selects indent one level per nesting depth.

use super::value::SqlValue;

/// Line separator of rendered statements.
pub const LINE_SEPARATOR: &str = "\r\n";

/// Indentation unit per nesting level.
pub const INDENT_UNIT: &str = "    ";

/// SQL Token - every element a statement or predicate is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    Where,
    And,
    Or,
    As,
    On,
    Join,
    Inner,
    Left,
    Right,
    Full,
    GroupBy,
    Having,
    OrderBy,
    Desc,
    Top,
    Distinct,
    In,
    NotIn,
    Between,
    NotBetween,
    Like,
    NotLike,
    IsNull,
    IsNotNull,

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,

    // === Operators ===
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,

    // === Whitespace / Formatting ===
    Space,
    Newline,
    NewlineIndent,

    // === Dynamic Content ===
    /// Identifier (table, column, alias), emitted verbatim.
    Ident(String),
    /// Aggregate or function name.
    FunctionName(&'static str),
    /// Integer literal (TOP counts).
    LitInt(u64),
    /// Inline literal value.
    Literal(SqlValue),
    /// Parameter placeholder (`@p0`).
    Placeholder(String),
    /// Tokens rendered one nesting level deeper.
    Nested(TokenStream),

    // === Escape Hatch ===
    /// Raw SQL passed directly to output.
    ///
    /// Never pass user input to this variant; use `Literal` or a
    /// `Placeholder` for values.
    Raw(String),
}

impl Token {
    /// Serialize this token at the given nesting depth.
    pub fn serialize(&self, depth: usize) -> String {
        match self {
            // Keywords
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::Or => "OR".into(),
            Token::As => "AS".into(),
            Token::On => "ON".into(),
            Token::Join => "JOIN".into(),
            Token::Inner => "INNER".into(),
            Token::Left => "LEFT".into(),
            Token::Right => "RIGHT".into(),
            Token::Full => "FULL".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::Having => "HAVING".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Desc => "DESC".into(),
            Token::Top => "TOP".into(),
            Token::Distinct => "DISTINCT".into(),
            Token::In => "IN".into(),
            Token::NotIn => "NOT IN".into(),
            Token::Between => "BETWEEN".into(),
            Token::NotBetween => "NOT BETWEEN".into(),
            Token::Like => "LIKE".into(),
            Token::NotLike => "NOT LIKE".into(),
            Token::IsNull => "IS NULL".into(),
            Token::IsNotNull => "IS NOT NULL".into(),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            // Operators
            Token::Eq => "=".into(),
            Token::Ne => "<>".into(),
            Token::Lt => "<".into(),
            Token::Gt => ">".into(),
            Token::Lte => "<=".into(),
            Token::Gte => ">=".into(),

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => format!("{}{}", LINE_SEPARATOR, INDENT_UNIT.repeat(depth)),
            Token::NewlineIndent => {
                format!("{}{}", LINE_SEPARATOR, INDENT_UNIT.repeat(depth + 1))
            }

            // Dynamic
            Token::Ident(name) => name.clone(),
            Token::FunctionName(name) => (*name).into(),
            Token::LitInt(n) => n.to_string(),
            Token::Literal(value) => value.to_literal(),
            Token::Placeholder(name) => name.clone(),
            Token::Nested(stream) => stream.serialize_at(depth + 1),

            // Escape hatch
            Token::Raw(s) => s.clone(),
        }
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Extend with multiple tokens.
    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Serialize all tokens at depth zero.
    pub fn serialize(&self) -> String {
        self.serialize_at(0)
    }

    /// Serialize all tokens at the given nesting depth.
    pub fn serialize_at(&self, depth: usize) -> String {
        self.tokens.iter().map(|t| t.serialize(depth)).collect()
    }

    /// Serialize on a single line: line breaks collapse to one space, or to
    /// nothing right inside parentheses, and nested streams are flattened.
    pub fn serialize_inline(&self) -> String {
        let mut flat = Vec::new();
        self.flatten_into(&mut flat);

        let mut out = String::new();
        for (i, token) in flat.iter().enumerate() {
            match token {
                Token::Newline | Token::NewlineIndent => {
                    let after_open = out.ends_with('(') || out.is_empty();
                    let before_close = matches!(flat.get(i + 1), Some(Token::RParen) | None);
                    if !after_open && !before_close && !out.ends_with(' ') {
                        out.push(' ');
                    }
                }
                other => out.push_str(&other.serialize(0)),
            }
        }
        out
    }

    fn flatten_into<'a>(&'a self, out: &mut Vec<&'a Token>) {
        for token in &self.tokens {
            match token {
                Token::Nested(stream) => stream.flatten_into(out),
                other => out.push(other),
            }
        }
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn newline_indent(&mut self) -> &mut Self {
        self.push(Token::NewlineIndent)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
    pub fn ident(&mut self, name: &str) -> &mut Self {
        self.push(Token::Ident(name.to_string()))
    }
}
