//! Shared literal-formatting and vendor keyword helpers.
//!
//! Every literal rendered without live parameters goes through these
//! functions, so field values and filter values are quoted the same way.

use chrono::{NaiveDate, NaiveDateTime};

use super::token::{Token, TokenStream};
use super::value::FiniteFloat;

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as numeric 1/0.
pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

// =============================================================================
// Numbers and temporal values
// =============================================================================

/// Format a float literal.
pub fn format_float(f: FiniteFloat) -> String {
    let mut buffer = ryu::Buffer::new();
    buffer.format_finite(f.get()).to_string()
}

/// Quote a date as `'YYYY-MM-DD'`.
pub fn format_date(date: &NaiveDate) -> String {
    quote_string_single(&date.format("%Y-%m-%d").to_string())
}

/// Quote a timestamp as `'YYYY-MM-DD HH:MM:SS[.fff]'`.
pub fn format_datetime(datetime: &NaiveDateTime) -> String {
    quote_string_single(&datetime.format("%Y-%m-%d %H:%M:%S%.f").to_string())
}

// =============================================================================
// Vendor keywords
// =============================================================================

/// Emit `TOP n` (SQL Server row limiting).
pub fn emit_top(n: u32) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Top).space().push(Token::LitInt(u64::from(n)));
    ts
}
