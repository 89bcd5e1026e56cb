//! YAML schema definition importer

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::SchemaImporter;
use crate::error::{Error, Result};
use crate::schema::options::{OptionValue, Options};
use crate::schema::types::{Schema, Table};

const TABLE_KEYS: &[&str] = &["id", "fields", "foreignKeys", "indexes", "uniqueConstraints"];
const COLUMN_KEYS: &[&str] = &["length", "scale", "precision", "type", "nullable", "options", "index"];
const INLINE_INDEX_KEYS: &[&str] = &["name", "unique", "options"];
const INDEX_KEYS: &[&str] = &["fields", "options", "flags"];
const FOREIGN_KEY_KEYS: &[&str] = &["fields", "foreignTable", "foreignFields", "options"];

/// Column attributes that are shorthands for column options
const COLUMN_OPTION_KEYS: &[&str] = &["length", "scale", "precision"];

/// Imports the YAML schema definition format
///
/// ```yaml
/// tables:
///   my_table:
///     id:
///       id: { type: integer, options: { autoincrement: true } }
///     fields:
///       name: { type: string, length: 64, index: ix_name }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlSchemaImporter;

impl YamlSchemaImporter {
    pub fn new() -> Self {
        Self
    }

    fn import_table(&self, schema: &Schema, name: &str, definition: &Value) -> Result<Table> {
        let definition = as_mapping(definition, name)?;
        ensure_no_extra_keys(definition, name, TABLE_KEYS)?;

        let mut table = schema.new_table(name);

        if let Some(id) = present(definition, "id") {
            let location = format!("{}.id", name);
            let columns = as_mapping(id, &location)?;
            self.add_columns(&mut table, columns)?;
            let primary_key: Vec<String> = columns.keys().map(key_name).collect();
            table.set_primary_key(&primary_key)?;
        }

        if let Some(fields) = present(definition, "fields") {
            let location = format!("{}.fields", name);
            self.add_columns(&mut table, as_mapping(fields, &location)?)?;
        }

        if let Some(foreign_keys) = present(definition, "foreignKeys") {
            let location = format!("{}.foreignKeys", name);
            for (fk_name, fk) in as_mapping(foreign_keys, &location)? {
                let fk_name = key_name(fk_name);
                let location = format!("{}.{}", location, fk_name);
                let fk = as_mapping(fk, &location)?;
                ensure_no_extra_keys(fk, &location, FOREIGN_KEY_KEYS)?;

                let local_columns = string_list(fk, "fields", &location)?;
                let foreign_table = string_value(fk, "foreignTable", &location)?;
                let foreign_columns = string_list(fk, "foreignFields", &location)?;
                let options = options(fk, &location)?;

                table.add_foreign_key_constraint(
                    &local_columns,
                    &foreign_table,
                    &foreign_columns,
                    options,
                    Some(&fk_name),
                )?;
            }
        }

        for (group, unique) in [("indexes", false), ("uniqueConstraints", true)] {
            let Some(indexes) = present(definition, group) else {
                continue;
            };

            let location = format!("{}.{}", name, group);
            for (index_name, index) in as_mapping(indexes, &location)? {
                let index_name = key_name(index_name);
                let location = format!("{}.{}", location, index_name);
                let index = as_mapping(index, &location)?;
                ensure_no_extra_keys(index, &location, INDEX_KEYS)?;

                let columns = string_list(index, "fields", &location)?;
                let flags = match present(index, "flags") {
                    Some(_) => string_list(index, "flags", &location)?,
                    None => Vec::new(),
                };
                let options = options(index, &location)?;

                if unique {
                    table.add_unique_index(&columns, Some(&index_name), flags, options)?;
                } else {
                    table.add_index(&columns, Some(&index_name), flags, options)?;
                }
            }
        }

        Ok(table)
    }

    /// Add the columns of an `id` or `fields` section
    fn add_columns(&self, table: &mut Table, columns: &Mapping) -> Result<()> {
        for (column_name, definition) in columns {
            let column_name = key_name(column_name);
            let location = format!("{}.fields.{}", table.name(), column_name);
            let definition = as_mapping(definition, &location)?;
            ensure_no_extra_keys(definition, &location, COLUMN_KEYS)?;

            let type_name = string_value(definition, "type", &location)?;
            let mut options = options(definition, &location)?;
            for key in COLUMN_OPTION_KEYS {
                if let Some(value) = present(definition, key) {
                    options.insert(key.to_string(), option_value(value, &location)?);
                }
            }

            let column = table.add_column(&column_name, &type_name, options)?;

            if let Some(nullable) = present(definition, "nullable") {
                let nullable = nullable.as_bool().ok_or_else(|| {
                    invalid_value(&format!("{}.nullable", location), "a bool", nullable)
                })?;
                column.set_notnull(!nullable);
            }

            if let Some(index) = present(definition, "index") {
                add_inline_index(table, &column_name, index, &format!("{}.index", location))?;
            }
        }

        Ok(())
    }
}

impl SchemaImporter for YamlSchemaImporter {
    fn import_source_into(&self, source: &str, schema: &mut Schema) -> Result<()> {
        let mut document: Value = if source.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(source)?
        };
        document.apply_merge()?;

        let missing_tables = || {
            Error::InvalidConfiguration(
                "Missing required key \"tables\" in schema configuration.".to_string(),
            )
        };
        let tables = match &document {
            Value::Mapping(root) => root.get("tables").ok_or_else(missing_tables)?,
            Value::Null => return Err(missing_tables()),
            other => return Err(invalid_value("tables", "a map", other)),
        };

        let tables = match tables {
            Value::Null => return Ok(()),
            other => as_mapping(other, "tables")?,
        };

        for (name, definition) in tables {
            let name = key_name(name);
            let table = self.import_table(schema, &name, definition)?;
            debug!(
                table = %name,
                columns = table.columns().count(),
                indexes = table.indexes().count(),
                foreign_keys = table.foreign_keys().count(),
                "Imported table"
            );
            schema.add_table(table)?;
        }

        Ok(())
    }
}

/// Add the single-column index declared by a column's `index` key
fn add_inline_index(table: &mut Table, column_name: &str, index: &Value, location: &str) -> Result<()> {
    let config = match index {
        Value::String(name) => {
            let mut config = Mapping::new();
            config.insert("name".into(), name.as_str().into());
            config
        }
        Value::Mapping(config) => config.clone(),
        other => return Err(invalid_value(location, "a string or a map", other)),
    };

    let name = match config.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(Error::InvalidConfiguration(format!(
                "Unhandled property in schema configuration for \"{}\". Expected \"name\" to be a string, found {}.",
                location,
                kind(other)
            )))
        }
        None => {
            return Err(Error::InvalidConfiguration(format!(
                "Unhandled property in schema configuration for \"{}\". Expected \"name\" to be a string, found null.",
                location
            )))
        }
    };
    ensure_no_extra_keys(&config, location, INLINE_INDEX_KEYS)?;

    let unique = match present(&config, "unique") {
        Some(value) => value
            .as_bool()
            .ok_or_else(|| invalid_value(&format!("{}.unique", location), "a bool", value))?,
        None => false,
    };
    let options = options(&config, location)?;

    if unique {
        table.add_unique_index(&[column_name], Some(&name), Vec::new(), options)
    } else {
        table.add_index(&[column_name], Some(&name), Vec::new(), options)
    }
}

/// Value of `key`, treating an explicit null as absent
fn present<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a Value> {
    mapping.get(key).filter(|value| !value.is_null())
}

fn ensure_no_extra_keys(mapping: &Mapping, location: &str, allowed: &[&str]) -> Result<()> {
    let extra: Vec<String> = mapping
        .keys()
        .map(key_name)
        .filter(|key| !allowed.contains(&key.as_str()))
        .collect();

    if extra.is_empty() {
        return Ok(());
    }

    let extra: Vec<&str> = extra.iter().map(String::as_str).collect();
    Err(Error::unhandled_keys(location, &extra, allowed))
}

fn as_mapping<'a>(value: &'a Value, location: &str) -> Result<&'a Mapping> {
    value
        .as_mapping()
        .ok_or_else(|| invalid_value(location, "a map", value))
}

fn string_value(mapping: &Mapping, key: &str, location: &str) -> Result<String> {
    match present(mapping, key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(invalid_value(&format!("{}.{}", location, key), "a string", other)),
        None => Err(missing_key(location, key)),
    }
}

fn string_list(mapping: &Mapping, key: &str, location: &str) -> Result<Vec<String>> {
    let value = present(mapping, key).ok_or_else(|| missing_key(location, key))?;
    let location = format!("{}.{}", location, key);

    value
        .as_sequence()
        .ok_or_else(|| invalid_value(&location, "a list of strings", value))?
        .iter()
        .map(|item| match item {
            Value::String(item) => Ok(item.clone()),
            other => Err(invalid_value(&location, "a list of strings", other)),
        })
        .collect()
}

/// The `options` bag of a definition, empty when absent
fn options(mapping: &Mapping, location: &str) -> Result<Options> {
    let Some(value) = present(mapping, "options") else {
        return Ok(Options::new());
    };

    let location = format!("{}.options", location);
    as_mapping(value, &location)?
        .iter()
        .map(|(key, value)| Ok((key_name(key), option_value(value, &location)?)))
        .collect()
}

fn option_value(value: &Value, location: &str) -> Result<OptionValue> {
    OptionValue::from_yaml(value.clone()).map_err(|_| {
        invalid_value(location, "a scalar, a list or a map", value)
    })
}

/// Mapping keys as written; non-string scalars keep their YAML spelling
fn key_name(key: &Value) -> String {
    match key {
        Value::String(key) => key.clone(),
        Value::Number(key) => key.to_string(),
        Value::Bool(key) => key.to_string(),
        other => kind(other).to_string(),
    }
}

/// Short description of a YAML value shape for error messages
fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(number) if number.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "map",
        Value::Tagged(_) => "tagged value",
    }
}

fn invalid_value(location: &str, expected: &str, found: &Value) -> Error {
    Error::InvalidConfiguration(format!(
        "Unhandled property in schema configuration for \"{}\". Expected {}, found {}.",
        location,
        expected,
        kind(found)
    ))
}

fn missing_key(location: &str, key: &str) -> Error {
    Error::InvalidConfiguration(format!(
        "Missing required key \"{}\" in schema configuration for \"{}\".",
        key, location
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn import(source: &str) -> Result<Schema> {
        YamlSchemaImporter.import_from_source(source, None)
    }

    fn error_message(source: &str) -> String {
        let err = import(source).unwrap_err();
        assert!(err.is_invalid_configuration(), "unexpected error: {}", err);
        err.to_string()
    }

    #[test]
    fn test_length_scale_and_precision_become_options() {
        let schema = import(
            r#"
tables:
  my_table:
    fields:
      name: { type: string, length: 64 }
      price: { type: decimal, precision: 19, scale: 4, options: { default: 0 } }
"#,
        )
        .unwrap();

        let table = schema.table("my_table").unwrap();
        assert_eq!(table.column("name").unwrap().length, Some(64));
        let price = table.column("price").unwrap();
        assert_eq!((price.precision, price.scale), (Some(19), Some(4)));
        assert_eq!(price.default, Some(OptionValue::Integer(0)));
        assert!(price.notnull);
    }

    #[test]
    fn test_inline_indexes() {
        let schema = import(
            r#"
tables:
  my_table:
    fields:
      data1: { type: integer, index: data1_idx }
      data2: { type: integer, index: { name: data2_idx } }
      data3: { type: string, index: { name: data3_uidx, unique: true } }
"#,
        )
        .unwrap();

        let table = schema.table("my_table").unwrap();
        let data1 = table.index("data1_idx").unwrap();
        assert_eq!(data1.columns, vec!["data1"]);
        assert!(!data1.is_unique);
        assert!(!table.index("data2_idx").unwrap().is_unique);
        assert!(table.index("data3_uidx").unwrap().is_unique);
    }

    #[test]
    fn test_index_flags_and_options() {
        let schema = import(
            r#"
tables:
  my_table:
    fields:
      body: { type: text }
    indexes:
      ix_body:
        fields: [body]
        flags: [fulltext]
        options: { lengths: [100] }
"#,
        )
        .unwrap();

        let index = schema.table("my_table").unwrap().index("ix_body").unwrap();
        assert!(index.has_flag("fulltext"));
        assert_eq!(index.lengths(), vec![Some(100)]);
    }

    #[rstest]
    #[case::empty_document("")]
    #[case::no_tables_key("schema: {}")]
    fn test_missing_tables_key(#[case] source: &str) {
        assert!(error_message(source).contains("\"tables\""));
    }

    #[rstest]
    #[case::empty_map("tables: {}")]
    #[case::null("tables: ~")]
    fn test_no_tables(#[case] source: &str) {
        assert!(import(source).unwrap().is_empty());
    }

    #[test]
    fn test_inline_index_must_be_string_or_map() {
        let message = error_message(
            "tables: { my_table: { fields: { data: { type: integer, index: [a] } } } }",
        );

        assert_eq!(
            message,
            "Invalid schema configuration: Unhandled property in schema configuration for \
             \"my_table.fields.data.index\". Expected a string or a map, found list."
        );
    }

    #[rstest]
    #[case("5", "int")]
    #[case("true", "bool")]
    #[case("1.5", "float")]
    fn test_inline_index_scalar_must_be_a_string(#[case] index: &str, #[case] kind: &str) {
        let message = error_message(&format!(
            "tables: {{ my_table: {{ fields: {{ data: {{ type: integer, index: {} }} }} }} }}",
            index
        ));

        assert_eq!(
            message,
            format!(
                "Invalid schema configuration: Unhandled property in schema configuration for \
                 \"my_table.fields.data.index\". Expected a string or a map, found {}.",
                kind
            )
        );
    }

    #[test]
    fn test_merge_keys_are_resolved() {
        let schema = import(
            "defaults: &int { type: integer, nullable: true }\n\
             tables: { t: { fields: { a: { <<: *int }, b: { <<: *int, nullable: false } } } }",
        )
        .unwrap();

        let table = schema.table("t").unwrap();
        let a = table.column("a").unwrap();
        assert_eq!(a.type_name, "integer");
        assert!(!a.notnull);
        assert!(table.column("b").unwrap().notnull);
    }

    #[test]
    fn test_inline_index_name_must_be_a_string() {
        let message = error_message(
            "tables: { my_table: { fields: { data: { type: integer, index: { name: 1 } } } } }",
        );

        assert_eq!(
            message,
            "Invalid schema configuration: Unhandled property in schema configuration for \
             \"my_table.fields.data.index\". Expected \"name\" to be a string, found int."
        );
    }

    #[test]
    fn test_inline_index_unknown_key() {
        let message = error_message(
            "tables: { my_table: { fields: { data: { type: integer, index: { name: ix, foo: 1 } } } } }",
        );

        assert!(message.contains("\"my_table.fields.data.index\". \"foo\" keys are not allowed"));
        assert!(message.ends_with("Allowed keys: \"name\", \"unique\", \"options\"."));
    }

    #[rstest]
    #[case::foreign_key(
        "tables: { t: { fields: { a: { type: integer } }, foreignKeys: { fk: { fields: [a], foreignTable: o, foreignFields: [id], cascade: true } } } }",
        "\"t.foreignKeys.fk\". \"cascade\" keys are not allowed"
    )]
    #[case::unique_constraint(
        "tables: { t: { fields: { a: { type: integer } }, uniqueConstraints: { ux: { fields: [a], where: x } } } }",
        "\"t.uniqueConstraints.ux\". \"where\" keys are not allowed"
    )]
    #[case::missing_type("tables: { t: { fields: { a: { nullable: true } } } }", "Missing required key \"type\"")]
    #[case::fields_not_a_list(
        "tables: { t: { fields: { a: { type: integer } }, indexes: { ix: { fields: a } } } }",
        "\"t.indexes.ix.fields\". Expected a list of strings, found string"
    )]
    #[case::table_not_a_map("tables: { t: [] }", "\"t\". Expected a map, found list")]
    fn test_invalid_definitions(#[case] source: &str, #[case] expected: &str) {
        let message = error_message(source);

        assert!(message.contains(expected), "unexpected message: {}", message);
    }

    #[test]
    fn test_model_errors_pass_through() {
        let err = import("tables: { t: { fields: { a: { type: integer } }, indexes: { ix: { fields: [missing] } } } }")
            .unwrap_err();

        assert!(matches!(err, Error::SchemaError(_)));
    }

    #[test]
    fn test_failed_table_keeps_previous_tables() {
        let mut schema = Schema::default();
        let result = YamlSchemaImporter.import_source_into(
            "tables: { first: { fields: { a: { type: integer } } }, second: { bogus: {} } }",
            &mut schema,
        );

        assert!(result.is_err());
        assert!(schema.has_table("first"));
        assert!(!schema.has_table("second"));
    }

    #[test]
    fn test_import_into_existing_schema() {
        let mut existing = Schema::default();
        existing.create_table("existing").unwrap();

        let schema = YamlSchemaImporter
            .import_from_source("tables: { imported: { fields: { a: { type: integer } } } }", Some(existing))
            .unwrap();

        let names: Vec<&str> = schema.tables().map(Table::name).collect();
        assert_eq!(names, vec!["existing", "imported"]);
    }
}
