//! Tests for joins and join-condition inference.

use std::sync::Arc;

use sqlparser::dialect::MsSqlDialect;
use sqlparser::parser::Parser;

use fluentsql::metadata::{Alias, Column, Entity, MetadataProvider};
use fluentsql::sql::{Comparator, JoinKind, SqlFilter, SqlMultiFilter, SqlSelect};
use fluentsql::SqlError;

struct Person;
impl Entity for Person {}

impl Person {
    const ID: Column<Person, i64> = Column::new("Id");
    const NAME: Column<Person, String> = Column::new("Name");
}

struct Passport;
impl Entity for Passport {}

impl Passport {
    const ID: Column<Passport, i64> = Column::new("Id");
    const PERSON_ID: Column<Passport, i64> = Column::new("PersonId");
    const NUMBER: Column<Passport, String> = Column::new("Number");
}

struct Visa;
impl Entity for Visa {}

impl Visa {
    const PASSPORT_ID: Column<Visa, i64> = Column::new("PassportId");
}

struct Employee;
impl Entity for Employee {}

impl Employee {
    const ID: Column<Employee, i64> = Column::new("Id");
    const MANAGER_ID: Column<Employee, i64> = Column::new("ManagerId");
}

struct Account;
impl Entity for Account {}

impl Account {
    const OWNER_ID: Column<Account, i64> = Column::new("OwnerId");
}

fn provider() -> Arc<MetadataProvider> {
    Arc::new(MetadataProvider::new())
}

fn validate_sql(sql: &str) {
    if let Err(e) = Parser::parse_sql(&MsSqlDialect {}, sql) {
        panic!("Invalid T-SQL: {e}\nSQL: {sql}");
    }
}

const PERSON_PASSPORT: &str = "SELECT\r\n    *\r\nFROM\r\n    Person pe\r\n\
                               INNER JOIN\r\n    Passport pa ON pe.Id = pa.PersonId";

#[test]
fn test_inner_join() {
    let select = SqlSelect::<Person>::new_in(provider())
        .unwrap()
        .inner_join(Person::ID.eq_column(Passport::PERSON_ID))
        .unwrap();
    assert_eq!(select.command_text().unwrap(), PERSON_PASSPORT);
    validate_sql(select.command_text().unwrap());
}

#[test]
fn test_operand_order_does_not_matter() {
    let select = SqlSelect::<Person>::new_in(provider())
        .unwrap()
        .inner_join(Passport::PERSON_ID.eq_column(Person::ID))
        .unwrap();
    assert_eq!(select.command_text().unwrap(), PERSON_PASSPORT);
}

#[test]
fn test_join_kinds() {
    let base = SqlSelect::<Person>::new_in(provider()).unwrap();
    let on = Person::ID.eq_column(Passport::PERSON_ID);

    let cases = [
        (base.left_join(on).unwrap(), "LEFT JOIN"),
        (base.right_join(on).unwrap(), "RIGHT JOIN"),
        (base.full_join(on).unwrap(), "FULL JOIN"),
        (base.join_on(JoinKind::Inner, on, None).unwrap(), "INNER JOIN"),
    ];
    for (select, keyword) in cases {
        let sql = select.command_text().unwrap();
        assert!(
            sql.contains(&format!("\r\n{keyword}\r\n    Passport pa ON pe.Id = pa.PersonId")),
            "{sql}"
        );
        validate_sql(sql);
    }
}

#[test]
fn test_join_kind_from_str() {
    assert_eq!("Inner".parse::<JoinKind>().unwrap(), JoinKind::Inner);
    assert_eq!("right outer".parse::<JoinKind>().unwrap(), JoinKind::Right);
    assert!(matches!(
        "cross".parse::<JoinKind>(),
        Err(SqlError::NotSupported(_))
    ));
}

#[test]
fn test_explicit_join_alias() {
    let select = SqlSelect::<Person>::new_in(provider())
        .unwrap()
        .join_on(
            JoinKind::Left,
            Person::ID.eq_column(Passport::PERSON_ID),
            Some(Alias::of::<Passport>("pp").unwrap()),
        )
        .unwrap();
    assert!(select
        .command_text()
        .unwrap()
        .ends_with("LEFT JOIN\r\n    Passport pp ON pe.Id = pp.PersonId"));
}

#[test]
fn test_second_join_of_joined_table_in_either_order() {
    let base = SqlSelect::<Person>::new_in(provider())
        .unwrap()
        .inner_join(Person::ID.eq_column(Passport::PERSON_ID))
        .unwrap();
    let expected = "LEFT JOIN\r\n    Passport pa2 ON pe.Id = pa2.PersonId";

    for on in [
        Person::ID.eq_column(Passport::PERSON_ID),
        Passport::PERSON_ID.eq_column(Person::ID),
    ] {
        let bound = base
            .join_on(JoinKind::Left, on, Some(Alias::of::<Passport>("pa2").unwrap()))
            .unwrap();
        let explicit = base
            .join_to::<Passport>(JoinKind::Left, on, Some(Alias::new("pa2").unwrap()))
            .unwrap();
        for select in [bound, explicit] {
            let sql = select.command_text().unwrap();
            assert!(sql.ends_with(expected), "{sql}");
            validate_sql(sql);
        }
    }
}

#[test]
fn test_join_to_requires_the_named_table() {
    let err = SqlSelect::<Person>::new_in(provider())
        .unwrap()
        .join_to::<Visa>(JoinKind::Inner, Person::ID.eq_column(Passport::PERSON_ID), None)
        .unwrap_err();
    assert!(matches!(err, SqlError::NotSupported(_)));
}

#[test]
fn test_join_to_self_join_names_second_operand() {
    let select = SqlSelect::<Employee>::new_in(provider())
        .unwrap()
        .join_to::<Employee>(
            JoinKind::Inner,
            Employee::ID.eq_column(Employee::MANAGER_ID),
            Some(Alias::new("rep").unwrap()),
        )
        .unwrap();
    assert!(select
        .command_text()
        .unwrap()
        .ends_with("INNER JOIN\r\n    Employee rep ON em.Id = rep.ManagerId"));
}

#[test]
fn test_join_with_filter_condition() {
    let p = provider();
    let condition = SqlFilter::of_in(p.clone(), Person::ID)
        .unwrap()
        .equal_to_column(Passport::PERSON_ID)
        .unwrap()
        .and_column(Passport::NUMBER)
        .unwrap()
        .is_not_null();
    let select = SqlSelect::<Person>::new_in(p)
        .unwrap()
        .join::<Passport>(JoinKind::Inner, &condition, None)
        .unwrap();
    assert!(select.command_text().unwrap().ends_with(
        "INNER JOIN\r\n    Passport pa ON pe.Id = pa.PersonId AND pa.Number IS NOT NULL"
    ));
}

#[test]
fn test_join_condition_is_always_literal() {
    let p = provider();
    let condition = SqlMultiFilter::new_in(p.clone())
        .and_column(Passport::NUMBER)
        .unwrap()
        .equal_to("X1");
    let select = SqlSelect::<Person>::new_in(p.clone())
        .unwrap()
        .join::<Passport>(JoinKind::Inner, &condition, None)
        .unwrap()
        .filter(&SqlFilter::of_in(p, Person::NAME).unwrap().equal_to("Bob"));

    assert_eq!(
        select.parametric_sql().unwrap(),
        "SELECT\r\n    *\r\nFROM\r\n    Person pe\r\n\
         INNER JOIN\r\n    Passport pa ON pa.Number = 'X1'\r\n\
         WHERE\r\n    pe.Name = @p0"
    );
    assert_eq!(select.parameters().unwrap().len(), 1);
}

#[test]
fn test_chained_joins() {
    let select = SqlSelect::<Person>::new_in(provider())
        .unwrap()
        .inner_join(Person::ID.eq_column(Passport::PERSON_ID))
        .unwrap()
        .left_join(Visa::PASSPORT_ID.eq_column(Passport::ID))
        .unwrap()
        .add_column(Visa::PASSPORT_ID)
        .unwrap();
    let sql = select.command_text().unwrap();
    assert_eq!(
        sql,
        "SELECT\r\n    vi.PassportId\r\nFROM\r\n    Person pe\r\n\
         INNER JOIN\r\n    Passport pa ON pe.Id = pa.PersonId\r\n\
         LEFT JOIN\r\n    Visa vi ON pa.Id = vi.PassportId"
    );
    validate_sql(sql);
}

#[test]
fn test_self_join_first_operand_is_left() {
    let select = SqlSelect::<Employee>::new_in(provider())
        .unwrap()
        .join_on(
            JoinKind::Left,
            Employee::MANAGER_ID.eq_column(Employee::ID),
            Some(Alias::of::<Employee>("mgr").unwrap()),
        )
        .unwrap();
    assert!(select
        .command_text()
        .unwrap()
        .ends_with("LEFT JOIN\r\n    Employee mgr ON em.ManagerId = mgr.Id"));
}

#[test]
fn test_self_join_without_alias_is_duplicate() {
    let err = SqlSelect::<Employee>::new_in(provider())
        .unwrap()
        .inner_join(Employee::MANAGER_ID.eq_column(Employee::ID))
        .unwrap_err();
    assert_eq!(err, SqlError::DuplicateJoinAlias { alias: "em".into() });
}

#[test]
fn test_duplicate_join_alias() {
    let select = SqlSelect::<Person>::new_in(provider())
        .unwrap()
        .inner_join(Person::ID.eq_column(Passport::PERSON_ID))
        .unwrap();
    let err = select
        .left_join(Passport::PERSON_ID.eq_column(Person::ID))
        .unwrap_err();
    assert_eq!(err, SqlError::DuplicateJoinAlias { alias: "pa".into() });
}

#[test]
fn test_non_equality_join_not_supported() {
    let err = SqlSelect::<Person>::new_in(provider())
        .unwrap()
        .inner_join(Person::ID.compare_column(Comparator::Lt, Passport::PERSON_ID))
        .unwrap_err();
    assert!(matches!(err, SqlError::NotSupported(_)));
}

#[test]
fn test_join_outside_scope_not_supported() {
    let err = SqlSelect::<Person>::new_in(provider())
        .unwrap()
        .inner_join(Account::OWNER_ID.eq_column(Passport::PERSON_ID))
        .unwrap_err();
    assert!(matches!(err, SqlError::NotSupported(_)));
}

#[test]
fn test_output_alias_colliding_with_join_alias() {
    let select = SqlSelect::<Person>::new_in(provider())
        .unwrap()
        .inner_join(Person::ID.eq_column(Passport::PERSON_ID))
        .unwrap();
    let select = select.add_fields([select.field(Person::NAME).with_output_alias("pa")]);
    assert_eq!(
        select.command_text().unwrap_err(),
        SqlError::IncorrectAlias { aliases: vec!["pa".into()] }
    );
}
