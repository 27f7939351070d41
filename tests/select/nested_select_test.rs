//! Tests for statements that select from a wrapped statement.

use std::sync::Arc;

use insta::assert_snapshot;
use sqlparser::dialect::MsSqlDialect;
use sqlparser::parser::Parser;

use fluentsql::metadata::{Alias, Column, Entity, EntityMeta, MetadataProvider};
use fluentsql::sql::{SqlField, SqlFilter, SqlSelect, SqlValue};
use fluentsql::SqlError;

struct Person;
impl Entity for Person {}

impl Person {
    const ID: Column<Person, i64> = Column::new("Id");
    const NAME: Column<Person, String> = Column::new("Name");
    const AGE: Column<Person, Option<i32>> = Column::new("Age");
}

struct Passport;
impl Entity for Passport {}

impl Passport {
    const PERSON_ID: Column<Passport, i64> = Column::new("PersonId");
    const NUMBER: Column<Passport, String> = Column::new("Number");
}

fn provider() -> Arc<MetadataProvider> {
    Arc::new(MetadataProvider::new())
}

fn lf(sql: &str) -> String {
    sql.replace("\r\n", "\n")
}

fn validate_sql(sql: &str) {
    if let Err(e) = Parser::parse_sql(&MsSqlDialect {}, sql) {
        panic!("Invalid T-SQL: {e}\nSQL: {sql}");
    }
}

fn people(p: &Arc<MetadataProvider>) -> SqlSelect<Person> {
    SqlSelect::<Person>::new_in(p.clone())
        .unwrap()
        .add_field(Person::ID)
        .add_field(Person::NAME)
}

#[test]
fn test_wrapped_statement_is_indented() {
    let outer = people(&provider()).wrap().add_field(Person::NAME);
    let sql = outer.command_text().unwrap();
    assert_eq!(
        sql,
        "SELECT\r\n    pe.Name\r\nFROM\r\n(\r\n    SELECT\r\n        pe.Id, pe.Name\r\n    \
         FROM\r\n        Person pe\r\n) AS pe"
    );
    validate_sql(sql);
}

#[test]
fn test_each_level_indents_once_more() {
    let select = SqlSelect::<Person>::new_in(provider()).unwrap().wrap().wrap();
    assert_snapshot!(lf(select.command_text().unwrap()), @r"
    SELECT
        *
    FROM
    (
        SELECT
            *
        FROM
        (
            SELECT
                *
            FROM
                Person pe
        ) AS pe
    ) AS pe
    ");
}

#[test]
fn test_wrap_as_renames_derived_table() {
    let outer = people(&provider()).wrap_as(Alias::of::<Person>("src").unwrap());
    let outer = outer.add_fields([outer.field(Person::ID)]);
    let sql = outer.command_text().unwrap();
    assert!(sql.starts_with("SELECT\r\n    src.Id\r\nFROM"));
    assert!(sql.ends_with(") AS src"));
}

#[test]
fn test_unknown_inner_field_fails_at_render() {
    let p = provider();
    // Adding the field succeeds even though the inner statement lacks it.
    let outer = people(&p).wrap().add_field(Person::AGE);

    let err = outer.command_text().unwrap_err();
    assert_eq!(
        err,
        SqlError::UnknownInnerField {
            field: "Person.Age".into()
        }
    );
    assert_eq!(outer.parametric().unwrap_err(), err);
}

#[test]
fn test_unknown_inner_field_in_where() {
    let p = provider();
    let outer = people(&p)
        .wrap()
        .filter(&SqlFilter::of_in(p.clone(), Person::AGE).unwrap().greater_than(1));
    assert!(matches!(
        outer.command_text(),
        Err(SqlError::UnknownInnerField { .. })
    ));
}

#[test]
fn test_unknown_inner_field_in_group_and_order() {
    let p = provider();
    assert!(matches!(
        people(&p).wrap().group_by(Person::AGE).command_text(),
        Err(SqlError::UnknownInnerField { .. })
    ));
    assert!(matches!(
        people(&p).wrap().order_by(Person::AGE).command_text(),
        Err(SqlError::UnknownInnerField { .. })
    ));
}

#[test]
fn test_inner_star_exposes_every_column() {
    let outer = SqlSelect::<Person>::new_in(provider())
        .unwrap()
        .wrap()
        .add_field(Person::AGE);
    assert!(outer.command_text().is_ok());
}

#[test]
fn test_inner_output_alias_is_the_exposed_name() {
    let p = provider();
    let inner = SqlSelect::<Person>::new_in(p.clone()).unwrap();
    let inner = inner.add_fields([inner.field(Person::AGE).max().with_output_alias("Oldest")]);
    let outer = inner.wrap();

    let by_alias = SqlField::new_in(
        &p,
        EntityMeta::of::<Person>(),
        Some(outer.alias().clone()),
        "Oldest",
    )
    .unwrap();
    let sql = outer.add_fields([by_alias]).command_text().unwrap().to_string();
    assert!(sql.starts_with("SELECT\r\n    pe.Oldest\r\nFROM"));

    // The column's own name is no longer visible once renamed.
    assert!(matches!(
        outer.add_field(Person::AGE).command_text(),
        Err(SqlError::UnknownInnerField { .. })
    ));
}

#[test]
fn test_inner_parameters_come_first() {
    let p = provider();
    let inner = people(&p).filter(&SqlFilter::of_in(p.clone(), Person::ID).unwrap().greater_than(10));
    let outer = inner
        .wrap()
        .add_field(Person::NAME)
        .filter(&SqlFilter::of_in(p, Person::NAME).unwrap().like("J%"));

    assert_snapshot!(lf(outer.parametric_sql().unwrap()), @r"
    SELECT
        pe.Name
    FROM
    (
        SELECT
            pe.Id, pe.Name
        FROM
            Person pe
        WHERE
            pe.Id > @p0
    ) AS pe
    WHERE
        pe.Name LIKE @p1
    ");
    let values: Vec<&SqlValue> = outer
        .parameters()
        .unwrap()
        .iter()
        .map(|param| &param.value)
        .collect();
    assert_eq!(values, vec![&SqlValue::Int(10), &SqlValue::String("J%".into())]);
    validate_sql(outer.command_text().unwrap());
}

#[test]
fn test_inner_failure_surfaces_from_outer() {
    let inner = SqlSelect::<Person>::new_in(provider()).unwrap();
    let inner = inner.add_fields([inner.field(Person::NAME).with_output_alias("pe")]);
    assert!(matches!(
        inner.wrap_as(Alias::new("src").unwrap()).command_text(),
        Err(SqlError::IncorrectAlias { .. })
    ));
}

#[test]
fn test_outer_join_columns_skip_inner_check() {
    let outer = people(&provider())
        .wrap()
        .inner_join(Person::ID.eq_column(Passport::PERSON_ID))
        .unwrap()
        .add_field(Person::NAME)
        .add_column(Passport::NUMBER)
        .unwrap();
    let sql = outer.command_text().unwrap();
    assert!(sql.starts_with("SELECT\r\n    pe.Name, pa.Number\r\nFROM"));
    assert!(sql.ends_with(") AS pe\r\nINNER JOIN\r\n    Passport pa ON pe.Id = pa.PersonId"));
    validate_sql(sql);
}
