//! SQLite platform
//!
//! Foreign keys only exist as part of `CREATE TABLE`; standalone foreign key
//! statements render as no-op comments.

use super::{decimal_precision, string_length, DbPlatform, LogicalType};
use crate::error::{Error, Result};
use crate::schema::column::Column;
use crate::schema::diff::ColumnDiff;
use crate::schema::index::{ForeignKey, Index};
use crate::schema::types::Table;
use crate::utils::naming::quote_if_reserved;

/// Placeholder emitted for statements SQLite cannot express
const NO_OP_STATEMENT: &str = "-- ";

/// SQLite DDL rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlitePlatform;

impl SqlitePlatform {
    /// Whether the column is the single-column autoincrement primary key
    fn is_rowid_alias(table: &Table, column: &Column) -> bool {
        column.autoincrement
            && matches!(table.primary_key_columns(), [only] if only.eq_ignore_ascii_case(&column.name))
    }
}

impl DbPlatform for SqlitePlatform {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn driver_names(&self) -> &'static [&'static str] {
        &["pdo_sqlite", "sqlite"]
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_if_reserved(name, '"', '"')
    }

    fn column_type_sql(&self, column: &Column) -> Result<String> {
        let sql = match LogicalType::parse(&column.type_name)? {
            LogicalType::SmallInt => "SMALLINT".to_string(),
            LogicalType::Integer => "INTEGER".to_string(),
            LogicalType::BigInt => "BIGINT".to_string(),
            LogicalType::String | LogicalType::AsciiString => {
                let kind = if column.fixed { "CHAR" } else { "VARCHAR" };
                format!("{}({})", kind, string_length(column))
            }
            LogicalType::Text | LogicalType::Json | LogicalType::SimpleArray => "CLOB".to_string(),
            LogicalType::Boolean => "BOOLEAN".to_string(),
            LogicalType::Decimal => {
                let (precision, scale) = decimal_precision(column);
                format!("NUMERIC({}, {})", precision, scale)
            }
            LogicalType::Float => "DOUBLE PRECISION".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::DateTime | LogicalType::DateTimeTz => "DATETIME".to_string(),
            LogicalType::Blob | LogicalType::Binary => "BLOB".to_string(),
            LogicalType::Guid => "CHAR(36)".to_string(),
        };
        Ok(sql)
    }

    fn boolean_literal(&self, value: bool) -> String {
        (if value { "1" } else { "0" }).to_string()
    }

    fn column_declaration_sql(&self, table: &Table, column: &Column) -> Result<String> {
        let name = self.quote_identifier(&column.name);
        // Autoincrement requires an INTEGER rowid alias; composite keys drop it
        if Self::is_rowid_alias(table, column) {
            return Ok(format!("{} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL", name));
        }

        let mut sql = format!("{} {}", name, self.column_type_sql(column)?);
        if let Some(default) = self.default_value_sql(column)? {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        }
        if column.notnull {
            sql.push_str(" NOT NULL");
        }
        Ok(sql)
    }

    fn primary_key_definition_sql(&self, table: &Table) -> Option<String> {
        let pk = table.primary_key()?;
        let inline = table
            .columns()
            .any(|column| Self::is_rowid_alias(table, column));
        if inline {
            return None;
        }
        Some(format!("PRIMARY KEY({})", self.column_list(&pk.columns)))
    }

    fn inlines_foreign_keys(&self) -> bool {
        true
    }

    fn inline_definitions_sql(&self, table: &Table) -> Vec<String> {
        table
            .foreign_keys()
            .map(|fk| self.foreign_key_definition_sql(fk))
            .collect()
    }

    fn create_foreign_key_sql(&self, _table_name: &str, _fk: &ForeignKey) -> String {
        NO_OP_STATEMENT.to_string()
    }

    fn drop_foreign_key_sql(&self, _table_name: &str, _fk: &ForeignKey) -> String {
        NO_OP_STATEMENT.to_string()
    }

    fn create_index_sql(&self, table_name: &str, index: &Index) -> Result<String> {
        if index.is_primary {
            return Err(Error::MigrationError(format!(
                "SQLite cannot add a primary key to the existing table \"{}\"",
                table_name
            )));
        }

        let unique = if index.is_unique { "UNIQUE " } else { "" };
        Ok(format!(
            "CREATE {}INDEX {} ON {} ({}){}",
            unique,
            self.quote_identifier(&index.name),
            self.quote_identifier(table_name),
            self.column_list(&index.columns),
            self.index_suffix_sql(index)
        ))
    }

    fn drop_index_sql(&self, table_name: &str, index: &Index) -> Result<String> {
        if index.is_primary {
            return Err(Error::MigrationError(format!(
                "SQLite cannot drop the primary key of the existing table \"{}\"",
                table_name
            )));
        }
        Ok(format!("DROP INDEX {}", self.quote_identifier(&index.name)))
    }

    fn alter_column_sql(&self, table: &Table, change: &ColumnDiff) -> Result<Vec<String>> {
        Err(Error::MigrationError(format!(
            "SQLite cannot change the definition of column \"{}\" on table \"{}\"",
            change.to.name,
            table.name()
        )))
    }
}
