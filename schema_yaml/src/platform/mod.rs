//! Database platforms
//!
//! A [`DbPlatform`] renders the schema model as DDL for one SQL dialect. The
//! shared rendering lives in the trait's provided methods; each dialect
//! overrides the hooks where it deviates.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::{MySqlFlavor, MySqlPlatform};
pub use postgres::PostgreSqlPlatform;
pub use sqlite::SqlitePlatform;

use crate::error::{Error, Result};
use crate::schema::column::Column;
use crate::schema::diff::{ColumnDiff, SchemaDiff, TableDiff};
use crate::schema::index::{ForeignKey, Index};
use crate::schema::options::OptionValue;
use crate::schema::types::{Schema, Table};

/// Platform names accepted when forcing a platform
pub const PLATFORM_NAMES: &[&str] = &["mysql8", "mysql", "mariadb", "postgres", "sqlite"];

/// Logical column types understood by every platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    SmallInt,
    Integer,
    BigInt,
    String,
    AsciiString,
    Text,
    Boolean,
    Decimal,
    Float,
    Date,
    Time,
    DateTime,
    DateTimeTz,
    Json,
    Blob,
    Binary,
    Guid,
    SimpleArray,
}

impl LogicalType {
    /// Parse a logical type name; `*_immutable` variants map to their base type
    pub fn parse(name: &str) -> Result<Self> {
        let normalized = name.to_lowercase();
        let base = normalized
            .strip_suffix("_immutable")
            .unwrap_or(&normalized);

        Ok(match base {
            "smallint" => LogicalType::SmallInt,
            "integer" => LogicalType::Integer,
            "bigint" => LogicalType::BigInt,
            "string" => LogicalType::String,
            "ascii_string" => LogicalType::AsciiString,
            "text" => LogicalType::Text,
            "boolean" => LogicalType::Boolean,
            "decimal" => LogicalType::Decimal,
            "float" => LogicalType::Float,
            "date" => LogicalType::Date,
            "time" => LogicalType::Time,
            "datetime" => LogicalType::DateTime,
            "datetimetz" => LogicalType::DateTimeTz,
            "json" => LogicalType::Json,
            "blob" => LogicalType::Blob,
            "binary" => LogicalType::Binary,
            "guid" => LogicalType::Guid,
            "simple_array" => LogicalType::SimpleArray,
            _ => {
                return Err(Error::PlatformError(format!(
                    "Unknown column type \"{}\" requested",
                    name
                )))
            }
        })
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            LogicalType::SmallInt | LogicalType::Integer | LogicalType::BigInt
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            LogicalType::Date | LogicalType::Time | LogicalType::DateTime | LogicalType::DateTimeTz
        )
    }
}

/// Length of a `VARCHAR`-like column, 255 when unset
pub(crate) fn string_length(column: &Column) -> u32 {
    column.length.unwrap_or(255)
}

/// Precision and scale of a decimal column, `10, 0` when unset
pub(crate) fn decimal_precision(column: &Column) -> (u32, u32) {
    (column.precision.unwrap_or(10), column.scale.unwrap_or(0))
}

fn is_current_expression(value: &str) -> bool {
    matches!(
        value.to_uppercase().as_str(),
        "CURRENT_TIMESTAMP" | "CURRENT_DATE" | "CURRENT_TIME"
    )
}

/// DDL rendering for one SQL dialect
pub trait DbPlatform: Send + Sync {
    /// Platform name, as accepted by `--force-platform`
    fn name(&self) -> &'static str;

    /// Connection driver names served by this platform
    fn driver_names(&self) -> &'static [&'static str];

    /// Quote an identifier if it is a reserved keyword
    fn quote_identifier(&self, name: &str) -> String;

    /// Native type of a column, including type modifiers
    fn column_type_sql(&self, column: &Column) -> Result<String>;

    /// Statements changing the definition of an existing column
    fn alter_column_sql(&self, table: &Table, change: &ColumnDiff) -> Result<Vec<String>>;

    fn boolean_literal(&self, value: bool) -> String {
        (if value { "true" } else { "false" }).to_string()
    }

    fn quote_string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Comma-separated, quoted column list
    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|column| self.quote_identifier(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// SQL literal of the column default, `None` if the column has none
    fn default_value_sql(&self, column: &Column) -> Result<Option<String>> {
        let Some(default) = &column.default else {
            return Ok(None);
        };
        if column.autoincrement {
            return Ok(None);
        }

        let logical = LogicalType::parse(&column.type_name)?;
        let sql = match default {
            OptionValue::Bool(value) => self.boolean_literal(*value),
            OptionValue::Integer(value) if logical == LogicalType::Boolean => {
                self.boolean_literal(*value != 0)
            }
            OptionValue::Integer(value) => value.to_string(),
            OptionValue::Float(value) => value.to_string(),
            OptionValue::String(value) if logical.is_temporal() && is_current_expression(value) => {
                value.to_uppercase()
            }
            other => self.quote_string_literal(&other.to_string()),
        };

        Ok(Some(sql))
    }

    /// Column definition as used by `CREATE TABLE` and `ADD` clauses
    fn column_declaration_sql(&self, _table: &Table, column: &Column) -> Result<String> {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.column_type_sql(column)?
        );
        if let Some(default) = self.default_value_sql(column)? {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        }
        if column.notnull {
            sql.push_str(" NOT NULL");
        }
        Ok(sql)
    }

    /// `PRIMARY KEY(..)` clause of `CREATE TABLE`, if any
    fn primary_key_definition_sql(&self, table: &Table) -> Option<String> {
        table
            .primary_key()
            .map(|pk| format!("PRIMARY KEY({})", self.column_list(&pk.columns)))
    }

    /// Extra clauses placed inside `CREATE TABLE` after the primary key
    fn inline_definitions_sql(&self, _table: &Table) -> Vec<String> {
        Vec::new()
    }

    /// Whether secondary indexes are part of `CREATE TABLE`
    fn inlines_indexes(&self) -> bool {
        false
    }

    /// Whether foreign keys are part of `CREATE TABLE`
    fn inlines_foreign_keys(&self) -> bool {
        false
    }

    /// Trailing table options of `CREATE TABLE`, with a leading space
    fn table_options_sql(&self, _table: &Table) -> String {
        String::new()
    }

    /// Standalone statement attaching a column comment
    fn column_comment_sql(&self, _table_name: &str, _column: &Column) -> Option<String> {
        None
    }

    fn create_table_sql(&self, table: &Table) -> Result<Vec<String>> {
        let mut definitions = table
            .columns()
            .map(|column| self.column_declaration_sql(table, column))
            .collect::<Result<Vec<_>>>()?;
        definitions.extend(self.primary_key_definition_sql(table));
        definitions.extend(self.inline_definitions_sql(table));

        let mut statements = vec![format!(
            "CREATE TABLE {} ({}){}",
            self.quote_identifier(table.name()),
            definitions.join(", "),
            self.table_options_sql(table)
        )];

        if !self.inlines_indexes() {
            for index in table.indexes().filter(|index| !index.is_primary) {
                statements.push(self.create_index_sql(table.name(), index)?);
            }
        }

        statements.extend(
            table
                .columns()
                .filter_map(|column| self.column_comment_sql(table.name(), column)),
        );

        Ok(statements)
    }

    fn drop_table_sql(&self, table_name: &str) -> String {
        format!("DROP TABLE {}", self.quote_identifier(table_name))
    }

    /// Index options rendered after the column list, e.g. a partial index predicate
    fn index_suffix_sql(&self, index: &Index) -> String {
        match index.options.get("where").and_then(OptionValue::as_str) {
            Some(predicate) => format!(" WHERE {}", predicate),
            None => String::new(),
        }
    }

    fn create_index_sql(&self, table_name: &str, index: &Index) -> Result<String> {
        let table = self.quote_identifier(table_name);
        if index.is_primary {
            return Ok(format!(
                "ALTER TABLE {} ADD PRIMARY KEY ({})",
                table,
                self.column_list(&index.columns)
            ));
        }

        let unique = if index.is_unique { "UNIQUE " } else { "" };
        Ok(format!(
            "CREATE {}INDEX {} ON {} ({}){}",
            unique,
            self.quote_identifier(&index.name),
            table,
            self.column_list(&index.columns),
            self.index_suffix_sql(index)
        ))
    }

    fn drop_index_sql(&self, _table_name: &str, index: &Index) -> Result<String> {
        Ok(format!("DROP INDEX {}", self.quote_identifier(&index.name)))
    }

    fn supports_deferrable_constraints(&self) -> bool {
        false
    }

    /// `CONSTRAINT .. FOREIGN KEY .. REFERENCES ..` clause
    fn foreign_key_definition_sql(&self, fk: &ForeignKey) -> String {
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_identifier(&fk.name),
            self.column_list(&fk.local_columns),
            self.quote_identifier(&fk.foreign_table),
            self.column_list(&fk.foreign_columns)
        );
        if let Some(action) = fk.on_update() {
            sql.push_str(" ON UPDATE ");
            sql.push_str(&action.to_uppercase());
        }
        if let Some(action) = fk.on_delete() {
            sql.push_str(" ON DELETE ");
            sql.push_str(&action.to_uppercase());
        }
        if self.supports_deferrable_constraints() {
            let flag = |key: &str| fk.options.get(key).and_then(OptionValue::as_bool).unwrap_or(false);
            sql.push_str(if flag("deferrable") { " DEFERRABLE" } else { " NOT DEFERRABLE" });
            sql.push_str(if flag("deferred") {
                " INITIALLY DEFERRED"
            } else {
                " INITIALLY IMMEDIATE"
            });
        }
        sql
    }

    fn create_foreign_key_sql(&self, table_name: &str, fk: &ForeignKey) -> String {
        format!(
            "ALTER TABLE {} ADD {}",
            self.quote_identifier(table_name),
            self.foreign_key_definition_sql(fk)
        )
    }

    fn drop_foreign_key_sql(&self, table_name: &str, fk: &ForeignKey) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_identifier(table_name),
            self.quote_identifier(&fk.name)
        )
    }

    fn add_column_sql(&self, table: &Table, column: &Column) -> Result<Vec<String>> {
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD {}",
            self.quote_identifier(table.name()),
            self.column_declaration_sql(table, column)?
        )];
        statements.extend(self.column_comment_sql(table.name(), column));
        Ok(statements)
    }

    fn drop_column_sql(&self, table_name: &str, column_name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_identifier(table_name),
            self.quote_identifier(column_name)
        )
    }

    /// Statements creating every table of the schema, foreign keys last
    fn create_schema_sql(&self, schema: &Schema) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for table in schema.tables() {
            statements.extend(self.create_table_sql(table)?);
        }

        if !self.inlines_foreign_keys() {
            for table in schema.tables() {
                for fk in table.foreign_keys() {
                    statements.push(self.create_foreign_key_sql(table.name(), fk));
                }
            }
        }

        Ok(statements)
    }

    /// Column and index changes of one table; foreign keys are handled by the caller
    fn alter_table_sql(&self, diff: &TableDiff) -> Result<Vec<String>> {
        let table = &diff.table;
        let mut statements = Vec::new();

        for index in &diff.dropped_indexes {
            statements.push(self.drop_index_sql(table.name(), index)?);
        }
        for column in &diff.dropped_columns {
            statements.push(self.drop_column_sql(table.name(), &column.name));
        }
        for column in &diff.added_columns {
            statements.extend(self.add_column_sql(table, column)?);
        }
        for change in &diff.changed_columns {
            statements.extend(self.alter_column_sql(table, change)?);
        }
        for index in &diff.added_indexes {
            statements.push(self.create_index_sql(table.name(), index)?);
        }

        Ok(statements)
    }

    /// Statements applying a schema diff
    fn alter_schema_sql(&self, diff: &SchemaDiff) -> Result<Vec<String>> {
        let mut statements = Vec::new();

        for table in &diff.changed_tables {
            for fk in &table.dropped_foreign_keys {
                statements.push(self.drop_foreign_key_sql(table.name(), fk));
            }
        }
        for table in &diff.dropped_tables {
            statements.push(self.drop_table_sql(table.name()));
        }
        for table in &diff.new_tables {
            statements.extend(self.create_table_sql(table)?);
        }
        for table in &diff.changed_tables {
            statements.extend(self.alter_table_sql(table)?);
        }

        if !self.inlines_foreign_keys() {
            for table in &diff.new_tables {
                for fk in table.foreign_keys() {
                    statements.push(self.create_foreign_key_sql(table.name(), fk));
                }
            }
        }
        for table in &diff.changed_tables {
            for fk in &table.added_foreign_keys {
                statements.push(self.create_foreign_key_sql(table.name(), fk));
            }
        }

        Ok(statements)
    }
}

/// Registry of platforms, looked up by connection driver
pub struct DbPlatformFactory {
    platforms: Vec<Box<dyn DbPlatform>>,
}

impl DbPlatformFactory {
    pub fn new(platforms: Vec<Box<dyn DbPlatform>>) -> Self {
        Self { platforms }
    }

    /// Create the platform for a platform name such as `mysql8` or `postgres`
    pub fn create(name: &str) -> Result<Box<dyn DbPlatform>> {
        let platform: Box<dyn DbPlatform> = match name.to_lowercase().as_str() {
            "mysql" => Box::new(MySqlPlatform::new(MySqlFlavor::MySql)),
            "mysql8" => Box::new(MySqlPlatform::new(MySqlFlavor::MySql80)),
            "mariadb" => Box::new(MySqlPlatform::new(MySqlFlavor::MariaDb)),
            "postgres" => Box::new(PostgreSqlPlatform),
            "sqlite" => Box::new(SqlitePlatform),
            _ => {
                return Err(Error::PlatformError(format!(
                    "Unknown platform \"{}\". Available platforms: \"{}\"",
                    name,
                    PLATFORM_NAMES.join("\", \"")
                )))
            }
        };
        Ok(platform)
    }

    /// Find the platform serving a connection driver, e.g. `pdo_pgsql` or `sqlite`
    pub fn from_driver_name(&self, driver: &str) -> Option<&dyn DbPlatform> {
        self.platforms
            .iter()
            .find(|platform| {
                platform
                    .driver_names()
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(driver))
            })
            .map(|platform| platform.as_ref())
    }
}

impl Default for DbPlatformFactory {
    fn default() -> Self {
        Self::new(vec![
            Box::new(MySqlPlatform::new(MySqlFlavor::MySql)),
            Box::new(PostgreSqlPlatform),
            Box::new(SqlitePlatform),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::options::Options;
    use rstest::rstest;

    #[rstest]
    #[case("integer", LogicalType::Integer)]
    #[case("STRING", LogicalType::String)]
    #[case("datetime_immutable", LogicalType::DateTime)]
    #[case("simple_array", LogicalType::SimpleArray)]
    fn test_parse_logical_type(#[case] name: &str, #[case] expected: LogicalType) {
        assert_eq!(LogicalType::parse(name).unwrap(), expected);
    }

    #[test]
    fn test_unknown_logical_type() {
        let err = LogicalType::parse("money").unwrap_err();

        assert!(matches!(err, Error::PlatformError(_)));
        assert!(err.to_string().contains("\"money\""));
    }

    #[rstest]
    #[case("mysql", "mysql")]
    #[case("MySQL8", "mysql8")]
    #[case("mariadb", "mariadb")]
    #[case("postgres", "postgres")]
    #[case("sqlite", "sqlite")]
    fn test_create_by_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(DbPlatformFactory::create(name).unwrap().name(), expected);
    }

    #[test]
    fn test_create_unknown_platform_lists_names() {
        let err = DbPlatformFactory::create("oracle").err().unwrap();

        assert!(err.to_string().contains("\"mysql8\", \"mysql\", \"mariadb\", \"postgres\", \"sqlite\""));
    }

    #[rstest]
    #[case("pdo_pgsql", "postgres")]
    #[case("postgresql", "postgres")]
    #[case("pdo_mysql", "mysql")]
    #[case("mysql", "mysql")]
    #[case("pdo_sqlite", "sqlite")]
    fn test_from_driver_name(#[case] driver: &str, #[case] expected: &str) {
        let factory = DbPlatformFactory::default();

        assert_eq!(factory.from_driver_name(driver).unwrap().name(), expected);
    }

    #[test]
    fn test_from_unknown_driver_name() {
        assert!(DbPlatformFactory::default().from_driver_name("oci8").is_none());
    }

    #[test]
    fn test_default_literals() {
        let platform = PostgreSqlPlatform;
        let literal = |column: Column| platform.default_value_sql(&column).unwrap();

        assert_eq!(literal(Column::new("a", "integer").with_default(5i64)), Some("5".to_string()));
        assert_eq!(literal(Column::new("a", "boolean").with_default(1i64)), Some("true".to_string()));
        assert_eq!(literal(Column::new("a", "string").with_default("it's")), Some("'it''s'".to_string()));
        assert_eq!(
            literal(Column::new("a", "datetime").with_default("current_timestamp")),
            Some("CURRENT_TIMESTAMP".to_string())
        );
        assert_eq!(
            literal(Column::new("a", "string").with_default("CURRENT_TIMESTAMP")),
            Some("'CURRENT_TIMESTAMP'".to_string())
        );
        assert_eq!(literal(Column::new("a", "integer")), None);
    }

    fn blog_schema(fk_name: &str, extra_table: &str) -> Schema {
        let mut schema = Schema::default();
        let users = schema.create_table("users").unwrap();
        users.add_column("id", "integer", Options::new()).unwrap();
        let posts = schema.create_table("posts").unwrap();
        posts.add_column("id", "integer", Options::new()).unwrap();
        posts.add_column("user_id", "integer", Options::new()).unwrap();
        posts
            .add_foreign_key_constraint(&["user_id"], "users", &["id"], Options::new(), Some(fk_name))
            .unwrap();
        schema
            .create_table(extra_table)
            .unwrap()
            .add_column("id", "integer", Options::new())
            .unwrap();
        schema
    }

    #[test]
    fn test_alter_schema_orders_statements() {
        let from = blog_schema("fk_old", "legacy");
        let to = blog_schema("fk_new", "tags");

        let diff = crate::schema::diff::Comparator::compare_schemas(&from, &to);
        let statements = PostgreSqlPlatform.alter_schema_sql(&diff).unwrap();

        assert_eq!(
            statements,
            vec![
                "ALTER TABLE posts DROP CONSTRAINT fk_old".to_string(),
                "DROP TABLE IF EXISTS legacy CASCADE".to_string(),
                "CREATE TABLE tags (id INT NOT NULL)".to_string(),
                "ALTER TABLE posts ADD CONSTRAINT fk_new FOREIGN KEY (user_id) REFERENCES users (id) NOT DEFERRABLE INITIALLY IMMEDIATE".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_diff_renders_nothing() {
        let platform = SqlitePlatform;

        assert!(platform.alter_schema_sql(&SchemaDiff::default()).unwrap().is_empty());
    }
}
