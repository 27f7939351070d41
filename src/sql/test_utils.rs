//! Test utilities for SQL emission validation.
//!
//! Rendered statements are parsed back with sqlparser-rs to make sure the
//! builder never emits text SQL Server would reject.

use sqlparser::dialect::MsSqlDialect;
use sqlparser::parser::Parser;

/// Validates that a SQL string is syntactically valid T-SQL.
///
/// # Example
///
/// ```ignore
/// use crate::sql::test_utils::validate_sql;
///
/// validate_sql("SELECT\r\n    *\r\nFROM\r\n    Person pe").unwrap();
/// ```
pub fn validate_sql(sql: &str) -> Result<(), String> {
    Parser::parse_sql(&MsSqlDialect {}, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid T-SQL: {}\nSQL: {}", e, sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_sql() {
        validate_sql("SELECT\r\n    TOP 5 pe.Id\r\nFROM\r\n    Person pe").unwrap();
    }

    #[test]
    fn test_validate_invalid_sql() {
        assert!(validate_sql("SELEC * FORM users").is_err());
    }
}
