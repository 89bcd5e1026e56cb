//! MySQL and MariaDB platforms

use super::{decimal_precision, string_length, DbPlatform, LogicalType};
use crate::error::Result;
use crate::schema::column::Column;
use crate::schema::diff::ColumnDiff;
use crate::schema::index::{ForeignKey, Index};
use crate::schema::options::OptionValue;
use crate::schema::types::Table;
use crate::utils::naming::quote_if_reserved;

/// MySQL server family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MySqlFlavor {
    MySql,
    MySql80,
    MariaDb,
}

/// MySQL DDL rendering
#[derive(Debug, Clone, Copy)]
pub struct MySqlPlatform {
    flavor: MySqlFlavor,
}

impl MySqlPlatform {
    pub fn new(flavor: MySqlFlavor) -> Self {
        Self { flavor }
    }

    /// Index column list honouring per-column prefix lengths
    fn index_columns_sql(&self, index: &Index) -> String {
        let lengths = index.lengths();
        index
            .columns
            .iter()
            .enumerate()
            .map(|(position, column)| match lengths.get(position).copied().flatten() {
                Some(length) => format!("{}({})", self.quote_identifier(column), length),
                None => self.quote_identifier(column),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn index_kind(index: &Index) -> &'static str {
        if index.is_unique {
            "UNIQUE INDEX"
        } else if index.has_flag("fulltext") {
            "FULLTEXT INDEX"
        } else if index.has_flag("spatial") {
            "SPATIAL INDEX"
        } else {
            "INDEX"
        }
    }

    fn integer_type_sql(&self, base: &str, column: &Column) -> String {
        let mut sql = base.to_string();
        if column.unsigned {
            sql.push_str(" UNSIGNED");
        }
        if column.autoincrement {
            sql.push_str(" AUTO_INCREMENT");
        }
        sql
    }
}

impl DbPlatform for MySqlPlatform {
    fn name(&self) -> &'static str {
        match self.flavor {
            MySqlFlavor::MySql => "mysql",
            MySqlFlavor::MySql80 => "mysql8",
            MySqlFlavor::MariaDb => "mariadb",
        }
    }

    fn driver_names(&self) -> &'static [&'static str] {
        &["pdo_mysql", "mysql", "mysqli"]
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_if_reserved(name, '`', '`')
    }

    fn column_type_sql(&self, column: &Column) -> Result<String> {
        let sql = match LogicalType::parse(&column.type_name)? {
            LogicalType::SmallInt => self.integer_type_sql("SMALLINT", column),
            LogicalType::Integer => self.integer_type_sql("INT", column),
            LogicalType::BigInt => self.integer_type_sql("BIGINT", column),
            LogicalType::String | LogicalType::AsciiString => {
                let kind = if column.fixed { "CHAR" } else { "VARCHAR" };
                format!("{}({})", kind, string_length(column))
            }
            LogicalType::Text | LogicalType::SimpleArray => "LONGTEXT".to_string(),
            LogicalType::Boolean => "TINYINT(1)".to_string(),
            LogicalType::Decimal => {
                let (precision, scale) = decimal_precision(column);
                let unsigned = if column.unsigned { " UNSIGNED" } else { "" };
                format!("NUMERIC({}, {}){}", precision, scale, unsigned)
            }
            LogicalType::Float => "DOUBLE PRECISION".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::DateTime | LogicalType::DateTimeTz => "DATETIME".to_string(),
            LogicalType::Json => match self.flavor {
                MySqlFlavor::MariaDb => "LONGTEXT".to_string(),
                MySqlFlavor::MySql | MySqlFlavor::MySql80 => "JSON".to_string(),
            },
            LogicalType::Blob => "LONGBLOB".to_string(),
            LogicalType::Binary => {
                let kind = if column.fixed { "BINARY" } else { "VARBINARY" };
                format!("{}({})", kind, string_length(column))
            }
            LogicalType::Guid => "CHAR(36)".to_string(),
        };
        Ok(sql)
    }

    fn boolean_literal(&self, value: bool) -> String {
        (if value { "1" } else { "0" }).to_string()
    }

    fn quote_string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

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
        if let Some(comment) = &column.comment {
            sql.push_str(" COMMENT ");
            sql.push_str(&self.quote_string_literal(comment));
        }
        Ok(sql)
    }

    fn inlines_indexes(&self) -> bool {
        true
    }

    fn inline_definitions_sql(&self, table: &Table) -> Vec<String> {
        table
            .indexes()
            .filter(|index| !index.is_primary)
            .map(|index| {
                format!(
                    "{} {} ({})",
                    Self::index_kind(index),
                    self.quote_identifier(&index.name),
                    self.index_columns_sql(index)
                )
            })
            .collect()
    }

    fn table_options_sql(&self, table: &Table) -> String {
        let option = |key: &str| table.options().get(key).and_then(OptionValue::as_str);
        let mut sql = String::new();

        if let Some(charset) = option("charset") {
            sql.push_str(&format!(" DEFAULT CHARACTER SET {}", charset));
        }
        if let Some(collate) = option("collate").or_else(|| option("collation")) {
            sql.push_str(&format!(" COLLATE `{}`", collate));
        }
        if let Some(engine) = option("engine") {
            sql.push_str(&format!(" ENGINE = {}", engine));
        }
        sql
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

        Ok(format!(
            "CREATE {} {} ON {} ({})",
            Self::index_kind(index),
            self.quote_identifier(&index.name),
            table,
            self.index_columns_sql(index)
        ))
    }

    fn drop_index_sql(&self, table_name: &str, index: &Index) -> Result<String> {
        let table = self.quote_identifier(table_name);
        if index.is_primary {
            return Ok(format!("ALTER TABLE {} DROP PRIMARY KEY", table));
        }
        Ok(format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(&index.name),
            table
        ))
    }

    fn drop_foreign_key_sql(&self, table_name: &str, fk: &ForeignKey) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quote_identifier(table_name),
            self.quote_identifier(&fk.name)
        )
    }

    fn alter_column_sql(&self, table: &Table, change: &ColumnDiff) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} CHANGE {} {}",
            self.quote_identifier(table.name()),
            self.quote_identifier(&change.from.name),
            self.column_declaration_sql(table, &change.to)?
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::diff::Comparator;
    use crate::schema::options::Options;
    use crate::schema::types::{Schema, SchemaConfig};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn options(yaml: &str) -> Options {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_create_schema_sql() {
        let mut config = SchemaConfig::default();
        config.default_table_options = options("charset: utf8mb4\ncollate: utf8mb4_unicode_520_ci\nengine: InnoDB");
        let mut schema = Schema::new(config);

        let table = schema.create_table("my_table").unwrap();
        table
            .add_column("id", "integer", options("autoincrement: true\nunsigned: true"))
            .unwrap();
        table.add_column("title", "string", options("length: 191")).unwrap();
        table.add_column("active", "boolean", options("default: true")).unwrap();
        table.add_column("parent_id", "integer", Options::new()).unwrap();
        table.set_primary_key(&["id"]).unwrap();
        table
            .add_index(
                &["title", "active"],
                Some("ix_title"),
                vec![],
                options("lengths: [100, ~]"),
            )
            .unwrap();
        table
            .add_foreign_key_constraint(&["parent_id"], "my_table", &["id"], Options::new(), Some("fk_parent"))
            .unwrap();

        let sql = schema.to_sql(&MySqlPlatform::new(MySqlFlavor::MySql80)).unwrap();

        assert_eq!(
            sql,
            vec![
                "CREATE TABLE my_table (id INT UNSIGNED AUTO_INCREMENT NOT NULL, title VARCHAR(191) NOT NULL, active TINYINT(1) DEFAULT 1 NOT NULL, parent_id INT NOT NULL, PRIMARY KEY(id), INDEX ix_title (title(100), active)) DEFAULT CHARACTER SET utf8mb4 COLLATE `utf8mb4_unicode_520_ci` ENGINE = InnoDB",
                "ALTER TABLE my_table ADD CONSTRAINT fk_parent FOREIGN KEY (parent_id) REFERENCES my_table (id)",
            ]
        );
    }

    #[rstest]
    #[case(MySqlFlavor::MySql, "JSON")]
    #[case(MySqlFlavor::MySql80, "JSON")]
    #[case(MySqlFlavor::MariaDb, "LONGTEXT")]
    fn test_json_type_per_flavor(#[case] flavor: MySqlFlavor, #[case] expected: &str) {
        let column = Column::new("data", "json");

        assert_eq!(MySqlPlatform::new(flavor).column_type_sql(&column).unwrap(), expected);
    }

    #[test]
    fn test_alter_column_uses_change() {
        let mut from = Table::new("key");
        from.add_column("value", "string", Options::new()).unwrap();
        let mut to = from.clone();
        to.column_mut("value").unwrap().comment = Some("it's".to_string());

        let diff = Comparator::compare_tables(&from, &to).unwrap();
        let platform = MySqlPlatform::new(MySqlFlavor::MySql);

        assert_eq!(
            platform.alter_table_sql(&diff).unwrap(),
            vec!["ALTER TABLE `key` CHANGE value value VARCHAR(255) NOT NULL COMMENT 'it''s'"]
        );
    }

    #[test]
    fn test_drop_statements() {
        let platform = MySqlPlatform::new(MySqlFlavor::MariaDb);
        let index = Index::new("ix_title", vec!["title".to_string()], false, false);
        let primary = Index::new("primary", vec!["id".to_string()], true, true);

        assert_eq!(platform.drop_index_sql("posts", &index).unwrap(), "DROP INDEX ix_title ON posts");
        assert_eq!(
            platform.drop_index_sql("posts", &primary).unwrap(),
            "ALTER TABLE posts DROP PRIMARY KEY"
        );
        assert_eq!(platform.drop_table_sql("posts"), "DROP TABLE posts");
    }
}
