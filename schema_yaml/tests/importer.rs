use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use rstest::rstest;
use schema_yaml::schema::{OptionValue, Options};
use schema_yaml::{Schema, SchemaImporter, YamlSchemaImporter};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn import(name: &str) -> Schema {
    YamlSchemaImporter
        .import_from_file(&fixture(name), None)
        .unwrap()
}

fn options(yaml: &str) -> Options {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn test_simple_primary_key() {
    let mut expected = Schema::default();
    let table = expected.create_table("my_table").unwrap();
    table
        .add_column("id", "integer", options("autoincrement: true"))
        .unwrap();
    table.set_primary_key(&["id"]).unwrap();

    assert_eq!(import("00-simple_pk.yaml"), expected);
}

#[test]
fn test_composite_primary_key() {
    let schema = import("01-composite_pk.yaml");

    let table = schema.table("my_table").unwrap();
    assert_eq!(table.primary_key_columns(), ["id", "version"]);
    assert_eq!(
        table.column("version").unwrap().default,
        Some(OptionValue::Integer(0))
    );
    assert!(!table.is_primary_key_column("name"));
    assert_eq!(
        table.columns().map(|column| column.name.as_str()).collect::<Vec<_>>(),
        vec!["id", "version", "name"]
    );
}

#[test]
fn test_composite_primary_key_with_autoincrement() {
    let mut expected = Schema::default();
    let table = expected.create_table("my_table").unwrap();
    table
        .add_column("id", "integer", options("autoincrement: true"))
        .unwrap();
    table
        .add_column("version", "integer", options("default: 0"))
        .unwrap();
    table.add_column("name", "string", Options::new()).unwrap();
    table.set_primary_key(&["id", "version"]).unwrap();

    assert_eq!(import("08-composite_pk_with_ai.yaml"), expected);
}

#[test]
fn test_index_flags() {
    let schema = import("09-index_flags.yaml");

    let table = schema.table("my_table").unwrap();
    assert!(table.index("ix_body").unwrap().has_flag("fulltext"));
    assert!(table.index("ix_title").unwrap().flags.is_empty());
}

#[test]
fn test_foreign_key() {
    let schema = import("02-foreign_key.yaml");

    assert_eq!(
        schema.tables().map(|table| table.name()).collect::<Vec<_>>(),
        vec!["my_main_table", "my_secondary_table"]
    );
    let fk = schema
        .table("my_secondary_table")
        .unwrap()
        .foreign_key("fk_my_secondary_table_id_main")
        .unwrap();
    assert_eq!(fk.foreign_table, "my_main_table");
    assert_eq!(fk.column_pairs().collect::<Vec<_>>(), vec![("main_id", "id")]);
    assert_eq!(fk.on_delete(), Some("CASCADE"));
    assert_eq!(fk.on_update(), Some("CASCADE"));
}

#[test]
fn test_nullable_field() {
    let schema = import("03-nullable_field.yaml");

    let column = schema.table("my_table").unwrap().column("data").unwrap();
    assert!(!column.notnull);
    assert_eq!(column.type_name, "integer");
}

#[test]
fn test_varchar_length() {
    let schema = import("04-varchar_length.yaml");

    let column = schema.table("my_table").unwrap().column("name").unwrap();
    assert_eq!(column.length, Some(64));
    assert!(column.notnull);
}

#[test]
fn test_indexes() {
    let schema = import("05-index.yaml");

    let table = schema.table("my_table").unwrap();
    let simple = table.index("ix_simple").unwrap();
    assert_eq!(simple.columns, vec!["data1"]);
    assert!(!simple.is_unique);
    assert_eq!(table.index("ix_composite").unwrap().columns, vec!["data1", "data2"]);
    let unique = table.index("ux_name").unwrap();
    assert!(unique.is_unique);
    assert!(!unique.is_primary);
    assert!(table.primary_key().is_none());
}

#[test]
fn test_numeric_options() {
    let schema = import("06-numeric_options.yaml");

    let column = schema.table("my_table").unwrap().column("data").unwrap();
    assert_eq!(column.precision, Some(19));
    assert_eq!(column.scale, Some(4));
}

#[test]
fn test_index_lengths() {
    let schema = import("07-index_lengths.yaml");

    let table = schema.table("my_table").unwrap();
    assert_eq!(table.index("ix_no_lengths").unwrap().lengths(), vec![None, None]);
    assert_eq!(table.index("ix_prefix").unwrap().lengths(), vec![None, Some(10)]);
}

#[test]
fn test_field_indexes() {
    let schema = import("simple-field-index.yaml");

    let table = schema.table("my_table").unwrap();
    let data1 = table.index("data1_idx").unwrap();
    assert_eq!(data1.columns, vec!["data1"]);
    assert!(!data1.is_unique);
    assert!(!table.index("data2_idx").unwrap().is_unique);
    let data3 = table.index("data3_uidx").unwrap();
    assert_eq!(data3.columns, vec!["data3"]);
    assert!(data3.is_unique);
}

#[rstest]
#[case(
    "failing-import.yaml",
    "Invalid schema configuration: Unhandled property in schema configuration for \"my_table\". \"foo\" keys are not allowed. Allowed keys: \"id\", \"fields\", \"foreignKeys\", \"indexes\", \"uniqueConstraints\"."
)]
#[case(
    "failing-import-column.yaml",
    "Invalid schema configuration: Unhandled property in schema configuration for \"my_table.fields.foo\". \"bar\" keys are not allowed. Allowed keys: \"length\", \"scale\", \"precision\", \"type\", \"nullable\", \"options\", \"index\"."
)]
fn test_invalid_definitions(#[case] name: &str, #[case] message: &str) {
    let err = YamlSchemaImporter
        .import_from_file(&fixture(name), None)
        .unwrap_err();

    assert!(err.is_invalid_configuration());
    assert_eq!(err.to_string(), message);
}

#[test]
fn test_import_into_existing_schema() {
    let existing = import("00-simple_pk.yaml");

    let err = YamlSchemaImporter
        .import_from_file(&fixture("03-nullable_field.yaml"), Some(existing.clone()))
        .unwrap_err();
    assert!(!err.is_invalid_configuration());

    let merged = YamlSchemaImporter
        .import_from_file(&fixture("02-foreign_key.yaml"), Some(existing))
        .unwrap();
    assert_eq!(merged.tables().count(), 3);
    assert!(merged.has_table("my_table"));
}

#[test]
fn test_missing_file() {
    let result = YamlSchemaImporter.import_from_file(&fixture("does-not-exist.yaml"), None);

    assert!(result.is_err());
}
