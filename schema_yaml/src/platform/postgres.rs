//! PostgreSQL platform

use super::{decimal_precision, string_length, DbPlatform, LogicalType};
use crate::error::Result;
use crate::schema::column::Column;
use crate::schema::diff::{ColumnDiff, ColumnProperty};
use crate::schema::index::Index;
use crate::schema::types::Table;
use crate::utils::naming::quote_if_reserved;

/// PostgreSQL DDL rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgreSqlPlatform;

impl PostgreSqlPlatform {
    /// Native type ignoring autoincrement, as needed by `ALTER .. TYPE`
    fn base_type_sql(&self, column: &Column) -> Result<String> {
        let sql = match LogicalType::parse(&column.type_name)? {
            LogicalType::SmallInt => "SMALLINT".to_string(),
            LogicalType::Integer => "INT".to_string(),
            LogicalType::BigInt => "BIGINT".to_string(),
            LogicalType::String | LogicalType::AsciiString => {
                let kind = if column.fixed { "CHAR" } else { "VARCHAR" };
                format!("{}({})", kind, string_length(column))
            }
            LogicalType::Text | LogicalType::SimpleArray => "TEXT".to_string(),
            LogicalType::Boolean => "BOOLEAN".to_string(),
            LogicalType::Decimal => {
                let (precision, scale) = decimal_precision(column);
                format!("NUMERIC({}, {})", precision, scale)
            }
            LogicalType::Float => "DOUBLE PRECISION".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME(0) WITHOUT TIME ZONE".to_string(),
            LogicalType::DateTime => "TIMESTAMP(0) WITHOUT TIME ZONE".to_string(),
            LogicalType::DateTimeTz => "TIMESTAMP(0) WITH TIME ZONE".to_string(),
            LogicalType::Json => "JSON".to_string(),
            LogicalType::Blob | LogicalType::Binary => "BYTEA".to_string(),
            LogicalType::Guid => "UUID".to_string(),
        };
        Ok(sql)
    }

    fn sequence_name(table_name: &str, column_name: &str) -> String {
        format!("{}_{}_seq", table_name, column_name)
    }
}

impl DbPlatform for PostgreSqlPlatform {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn driver_names(&self) -> &'static [&'static str] {
        &["pdo_pgsql", "postgres", "postgresql"]
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_if_reserved(name, '"', '"')
    }

    fn column_type_sql(&self, column: &Column) -> Result<String> {
        if column.autoincrement {
            match LogicalType::parse(&column.type_name)? {
                LogicalType::SmallInt => return Ok("SMALLSERIAL".to_string()),
                LogicalType::Integer => return Ok("SERIAL".to_string()),
                LogicalType::BigInt => return Ok("BIGSERIAL".to_string()),
                _ => {}
            }
        }
        self.base_type_sql(column)
    }

    fn supports_deferrable_constraints(&self) -> bool {
        true
    }

    fn column_comment_sql(&self, table_name: &str, column: &Column) -> Option<String> {
        column.comment.as_ref().map(|comment| {
            format!(
                "COMMENT ON COLUMN {}.{} IS {}",
                self.quote_identifier(table_name),
                self.quote_identifier(&column.name),
                self.quote_string_literal(comment)
            )
        })
    }

    fn drop_table_sql(&self, table_name: &str) -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE", self.quote_identifier(table_name))
    }

    fn drop_index_sql(&self, table_name: &str, index: &Index) -> Result<String> {
        if index.is_primary {
            return Ok(format!(
                "ALTER TABLE {} DROP CONSTRAINT {}_pkey",
                self.quote_identifier(table_name),
                table_name
            ));
        }
        Ok(format!("DROP INDEX {}", self.quote_identifier(&index.name)))
    }

    fn alter_column_sql(&self, table: &Table, change: &ColumnDiff) -> Result<Vec<String>> {
        let column = &change.to;
        let prefix = format!(
            "ALTER TABLE {} ALTER {}",
            self.quote_identifier(table.name()),
            self.quote_identifier(&column.name)
        );
        let mut statements = Vec::new();

        let type_changed = [
            ColumnProperty::Type,
            ColumnProperty::Length,
            ColumnProperty::Precision,
            ColumnProperty::Scale,
            ColumnProperty::Fixed,
        ]
        .into_iter()
        .any(|property| change.has_changed(property));
        if type_changed {
            statements.push(format!("{} TYPE {}", prefix, self.base_type_sql(column)?));
        }

        if change.has_changed(ColumnProperty::Default) && !column.autoincrement {
            statements.push(match self.default_value_sql(column)? {
                Some(default) => format!("{} SET DEFAULT {}", prefix, default),
                None => format!("{} DROP DEFAULT", prefix),
            });
        }

        if change.has_changed(ColumnProperty::Autoincrement) {
            if column.autoincrement {
                let sequence = Self::sequence_name(table.name(), &column.name);
                statements.push(format!("CREATE SEQUENCE {}", sequence));
                statements.push(format!(
                    "SELECT setval('{}', (SELECT MAX({}) FROM {}))",
                    sequence,
                    self.quote_identifier(&column.name),
                    self.quote_identifier(table.name())
                ));
                statements.push(format!("{} SET DEFAULT nextval('{}')", prefix, sequence));
            } else {
                statements.push(format!("{} DROP DEFAULT", prefix));
            }
        }

        if change.has_changed(ColumnProperty::NotNull) {
            let action = if column.notnull { "SET" } else { "DROP" };
            statements.push(format!("{} {} NOT NULL", prefix, action));
        }

        if change.has_changed(ColumnProperty::Comment) {
            statements.push(self.column_comment_sql(table.name(), column).unwrap_or_else(|| {
                format!(
                    "COMMENT ON COLUMN {}.{} IS NULL",
                    self.quote_identifier(table.name()),
                    self.quote_identifier(&column.name)
                )
            }));
        }

        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::diff::Comparator;
    use crate::schema::options::{OptionValue, Options};
    use crate::schema::types::Schema;
    use pretty_assertions::assert_eq;

    fn options(yaml: &str) -> Options {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_create_schema_sql() {
        let mut schema = Schema::default();
        let main = schema.create_table("main_table").unwrap();
        main.add_column("id", "integer", options("autoincrement: true")).unwrap();
        main.set_primary_key(&["id"]).unwrap();

        let table = schema.create_table("my_table").unwrap();
        table.add_column("id", "bigint", Options::new()).unwrap();
        table.add_column("main_id", "integer", Options::new()).unwrap();
        table.add_column("name", "string", options("length: 64\ndefault: ''")).unwrap();
        table.add_column("price", "decimal", options("precision: 19\nscale: 4")).unwrap();
        table.column_mut("name").unwrap().set_notnull(false);
        table.set_primary_key(&["id"]).unwrap();
        table
            .add_unique_index(&["name"], Some("ux_name"), vec![], Options::new())
            .unwrap();
        table
            .add_foreign_key_constraint(
                &["main_id"],
                "main_table",
                &["id"],
                options("onDelete: CASCADE\nonUpdate: CASCADE"),
                Some("fk_main"),
            )
            .unwrap();

        let sql = schema.to_sql(&PostgreSqlPlatform).unwrap();

        assert_eq!(
            sql,
            vec![
                "CREATE TABLE main_table (id SERIAL NOT NULL, PRIMARY KEY(id))",
                "CREATE TABLE my_table (id BIGINT NOT NULL, main_id INT NOT NULL, name VARCHAR(64) DEFAULT '', price NUMERIC(19, 4) NOT NULL, PRIMARY KEY(id))",
                "CREATE UNIQUE INDEX ux_name ON my_table (name)",
                "ALTER TABLE my_table ADD CONSTRAINT fk_main FOREIGN KEY (main_id) REFERENCES main_table (id) ON UPDATE CASCADE ON DELETE CASCADE NOT DEFERRABLE INITIALLY IMMEDIATE",
            ]
        );
    }

    #[test]
    fn test_reserved_identifiers_are_quoted() {
        let mut schema = Schema::default();
        let table = schema.create_table("user").unwrap();
        table.add_column("order", "text", Options::new()).unwrap();
        table.column_mut("order").unwrap().comment = Some("Sort key".to_string());

        let sql = schema.to_sql(&PostgreSqlPlatform).unwrap();

        assert_eq!(
            sql,
            vec![
                "CREATE TABLE \"user\" (\"order\" TEXT NOT NULL)",
                "COMMENT ON COLUMN \"user\".\"order\" IS 'Sort key'",
            ]
        );
    }

    #[test]
    fn test_alter_column() {
        let mut from = Table::new("items");
        from.add_column("label", "string", Options::new()).unwrap();
        let mut to = from.clone();
        let label = to.column_mut("label").unwrap();
        label.set_length(Some(32)).set_notnull(false);
        label.set_default(Some(OptionValue::from("none")));

        let diff = Comparator::compare_tables(&from, &to).unwrap();
        let sql = PostgreSqlPlatform
            .alter_column_sql(&diff.table, &diff.changed_columns[0])
            .unwrap();

        assert_eq!(
            sql,
            vec![
                "ALTER TABLE items ALTER label TYPE VARCHAR(32)",
                "ALTER TABLE items ALTER label SET DEFAULT 'none'",
                "ALTER TABLE items ALTER label DROP NOT NULL",
            ]
        );
    }

    #[test]
    fn test_drop_primary_key() {
        let index = Index::new("primary", vec!["id".to_string()], true, true);

        assert_eq!(
            PostgreSqlPlatform.drop_index_sql("items", &index).unwrap(),
            "ALTER TABLE items DROP CONSTRAINT items_pkey"
        );
    }
}
