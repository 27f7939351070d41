//! Tests for TOML settings and providers built from them.

use std::sync::Arc;

use fluentsql::config::{Settings, SettingsError};
use fluentsql::metadata::{Column, Entity, MetadataProvider};
use fluentsql::sql::SqlFilter;

struct Person;
impl Entity for Person {}

impl Person {
    const ID: Column<Person, i64> = Column::new("Id");
}

struct Passport;
impl Entity for Passport {}

#[test]
fn test_defaults_when_empty() {
    let settings = Settings::from_toml_str("").unwrap();
    assert_eq!(settings.render.parameter_prefix, "p");
    assert!(settings.aliases.is_empty());
}

#[test]
fn test_full_settings() {
    let settings = Settings::from_toml_str(
        r#"
[render]
parameter_prefix = "prm"

[aliases]
Person = "per"
"#,
    )
    .unwrap();
    assert_eq!(settings.render.parameter_prefix, "prm");
    assert_eq!(settings.aliases.get("Person").map(String::as_str), Some("per"));
}

#[test]
fn test_invalid_prefix_rejected() {
    let err = Settings::from_toml_str("[render]\nparameter_prefix = \"@x\"\n").unwrap_err();
    assert!(matches!(err, SettingsError::InvalidConfig(_)));
}

#[test]
fn test_alias_used_twice_rejected() {
    let err = Settings::from_toml_str("[aliases]\nPerson = \"x\"\nPassport = \"x\"\n").unwrap_err();
    assert!(matches!(err, SettingsError::InvalidConfig(_)));
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let err = Settings::from_toml_str("[render\n").unwrap_err();
    assert!(matches!(err, SettingsError::ParseError(_)));
}

#[test]
fn test_missing_file() {
    let err = Settings::from_file("/nonexistent/fluentsql.toml").unwrap_err();
    assert!(matches!(err, SettingsError::FileNotFound(_)));
}

#[test]
fn test_provider_from_settings() {
    let settings = Settings::from_toml_str(
        r#"
[render]
parameter_prefix = "prm"

[aliases]
Person = "per"
"#,
    )
    .unwrap();
    let provider = Arc::new(MetadataProvider::from_settings(&settings).unwrap());

    assert_eq!(provider.alias_for::<Person>().unwrap().value(), "per");
    // Tables without an explicit alias still derive one.
    assert_eq!(provider.alias_for::<Passport>().unwrap().value(), "pa");

    let filter = SqlFilter::of_in(provider.clone(), Person::ID).unwrap().equal_to(5);
    assert_eq!(filter.parametric_sql(), "per.Id = @prm0");

    let raw = SqlFilter::<Person>::raw_in(provider.clone(), "LEN(per.Name)")
        .greater_than(3)
        .and(Person::ID)
        .unwrap()
        .is_not_null();
    assert_eq!(raw.parametric_sql(), "LEN(per.Name) > @prm0 AND per.Id IS NOT NULL");
    assert_eq!(raw.raw_sql(), "LEN(per.Name) > 3 AND per.Id IS NOT NULL");
    assert!(Arc::ptr_eq(raw.provider(), &provider));
}
