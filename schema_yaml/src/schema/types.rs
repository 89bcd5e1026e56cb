//! Type definitions for the in-memory schema model
//!
//! A [`Schema`] owns its tables; every [`Table`] owns its columns, indexes and
//! foreign keys. Lookups are case-insensitive while enumeration follows
//! insertion order.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::platform::DbPlatform;
use crate::schema::column::Column;
use crate::schema::index::{ForeignKey, Index};
use crate::schema::options::Options;
use crate::utils::naming::{generate_identifier_name, normalize_identifier};

/// Name of the primary key index
pub const PRIMARY_KEY_NAME: &str = "primary";

/// Default maximum identifier length used for generated names
pub const DEFAULT_MAX_IDENTIFIER_LENGTH: usize = 63;

/// Schema-wide configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaConfig {
    pub max_identifier_length: usize,
    /// Options every table created through the schema starts with
    pub default_table_options: Options,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_identifier_length: DEFAULT_MAX_IDENTIFIER_LENGTH,
            default_table_options: Options::new(),
        }
    }
}

/// Represents a complete database schema
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    config: SchemaConfig,
    tables: IndexMap<String, Table>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            tables: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Build a detached table carrying this schema's defaults
    ///
    /// The table becomes part of the schema once passed to [`Schema::add_table`].
    pub fn new_table(&self, name: &str) -> Table {
        let mut table = Table::new(name);
        table.options = self.config.default_table_options.clone();
        table.max_identifier_length = self.config.max_identifier_length;
        table
    }

    /// Create a table and add it to the schema
    pub fn create_table(&mut self, name: &str) -> Result<&mut Table> {
        let table = self.new_table(name);
        self.add_table(table)
    }

    /// Add a fully built table to the schema
    pub fn add_table(&mut self, table: Table) -> Result<&mut Table> {
        if table.name.is_empty() {
            return Err(Error::SchemaError("Table name must not be empty".to_string()));
        }

        let key = normalize_identifier(&table.name);
        if self.tables.contains_key(&key) {
            return Err(Error::SchemaError(format!(
                "The table with name \"{}\" already exists",
                table.name
            )));
        }

        let entry = self.tables.entry(key).or_insert(table);
        Ok(entry)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(&normalize_identifier(name))
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&normalize_identifier(name))
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(&normalize_identifier(name))
    }

    /// Remove a table, keeping the order of the remaining ones
    pub fn drop_table(&mut self, name: &str) -> Option<Table> {
        self.tables.shift_remove(&normalize_identifier(name))
    }

    /// Tables in insertion order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Render the statements creating this schema on the given platform
    pub fn to_sql(&self, platform: &dyn DbPlatform) -> Result<Vec<String>> {
        platform.create_schema_sql(self)
    }
}

/// Represents a database table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: IndexMap<String, Column>,
    indexes: IndexMap<String, Index>,
    primary_key: Option<String>,
    foreign_keys: IndexMap<String, ForeignKey>,
    options: Options,
    max_identifier_length: usize,
}

impl Table {
    /// Create a new table with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: IndexMap::new(),
            indexes: IndexMap::new(),
            primary_key: None,
            foreign_keys: IndexMap::new(),
            options: Options::new(),
            max_identifier_length: DEFAULT_MAX_IDENTIFIER_LENGTH,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table-level options such as `charset`, `collate` or `engine`
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Add a column to the table
    pub fn add_column(&mut self, name: &str, type_name: &str, options: Options) -> Result<&mut Column> {
        if name.is_empty() {
            return Err(Error::SchemaError(format!(
                "Column name must not be empty in table \"{}\"",
                self.name
            )));
        }

        let key = normalize_identifier(name);
        if self.columns.contains_key(&key) {
            return Err(Error::SchemaError(format!(
                "The column \"{}\" on table \"{}\" already exists",
                name, self.name
            )));
        }

        let mut column = Column::new(name, type_name);
        column.set_options(options)?;

        Ok(self.columns.entry(key).or_insert(column))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(&normalize_identifier(name))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(&normalize_identifier(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(&normalize_identifier(name))
    }

    /// Columns in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Set the primary key; every listed column becomes NOT NULL
    pub fn set_primary_key<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<()> {
        if self.primary_key.is_some() {
            return Err(Error::SchemaError(format!(
                "Table \"{}\" already has a primary key",
                self.name
            )));
        }

        let columns = self.existing_columns(columns, PRIMARY_KEY_NAME)?;
        for column in &columns {
            if let Some(column) = self.column_mut(column) {
                column.set_notnull(true);
            }
        }

        let index = Index::new(PRIMARY_KEY_NAME, columns, true, true);
        self.insert_index(index)?;
        self.primary_key = Some(PRIMARY_KEY_NAME.to_string());
        Ok(())
    }

    pub fn primary_key(&self) -> Option<&Index> {
        self.primary_key
            .as_ref()
            .and_then(|key| self.indexes.get(key))
    }

    /// Names of the primary key columns, empty if there is no primary key
    pub fn primary_key_columns(&self) -> &[String] {
        self.primary_key()
            .map(|pk| pk.columns.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_primary_key_column(&self, name: &str) -> bool {
        self.primary_key_columns()
            .iter()
            .any(|column| column.eq_ignore_ascii_case(name))
    }

    /// Add a plain index; a missing name is generated
    pub fn add_index<S: AsRef<str>>(
        &mut self,
        columns: &[S],
        name: Option<&str>,
        flags: Vec<String>,
        options: Options,
    ) -> Result<()> {
        self.add_index_with(columns, name, false, flags, options)
    }

    /// Add a unique index; a missing name is generated
    pub fn add_unique_index<S: AsRef<str>>(
        &mut self,
        columns: &[S],
        name: Option<&str>,
        flags: Vec<String>,
        options: Options,
    ) -> Result<()> {
        self.add_index_with(columns, name, true, flags, options)
    }

    fn add_index_with<S: AsRef<str>>(
        &mut self,
        columns: &[S],
        name: Option<&str>,
        is_unique: bool,
        flags: Vec<String>,
        options: Options,
    ) -> Result<()> {
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                let prefix = if is_unique { "uniq" } else { "idx" };
                self.generate_name(columns, prefix)
            }
        };

        let columns = self.existing_columns(columns, &name)?;
        let mut index = Index::new(&name, columns, is_unique, false);
        index.flags = flags;
        index.options = options;
        self.insert_index(index)
    }

    fn insert_index(&mut self, index: Index) -> Result<()> {
        let key = normalize_identifier(&index.name);
        if self.indexes.contains_key(&key) {
            return Err(Error::SchemaError(format!(
                "An index with name \"{}\" was already defined on table \"{}\"",
                index.name, self.name
            )));
        }

        self.indexes.insert(key, index);
        Ok(())
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains_key(&normalize_identifier(name))
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.get(&normalize_identifier(name))
    }

    /// Indexes in insertion order, primary key included
    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.values()
    }

    /// Add a foreign key constraint; a missing name is generated
    pub fn add_foreign_key_constraint<S: AsRef<str>, F: AsRef<str>>(
        &mut self,
        local_columns: &[S],
        foreign_table: &str,
        foreign_columns: &[F],
        options: Options,
        name: Option<&str>,
    ) -> Result<()> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.generate_name(local_columns, "fk"),
        };

        if local_columns.len() != foreign_columns.len() {
            return Err(Error::SchemaError(format!(
                "Foreign key \"{}\" on table \"{}\" pairs {} local columns with {} foreign columns",
                name,
                self.name,
                local_columns.len(),
                foreign_columns.len()
            )));
        }

        let local_columns = self.existing_columns(local_columns, &name)?;
        let key = normalize_identifier(&name);
        if self.foreign_keys.contains_key(&key) {
            return Err(Error::SchemaError(format!(
                "A foreign key with name \"{}\" was already defined on table \"{}\"",
                name, self.name
            )));
        }

        self.foreign_keys.insert(
            key,
            ForeignKey {
                name,
                local_columns,
                foreign_table: foreign_table.to_string(),
                foreign_columns: foreign_columns
                    .iter()
                    .map(|c| c.as_ref().to_string())
                    .collect(),
                options,
            },
        );
        Ok(())
    }

    pub fn has_foreign_key(&self, name: &str) -> bool {
        self.foreign_keys.contains_key(&normalize_identifier(name))
    }

    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.get(&normalize_identifier(name))
    }

    /// Foreign keys in insertion order
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.foreign_keys.values()
    }

    /// Resolve column names against the table, failing on unknown columns
    fn existing_columns<S: AsRef<str>>(&self, columns: &[S], owner: &str) -> Result<Vec<String>> {
        if columns.is_empty() {
            return Err(Error::SchemaError(format!(
                "\"{}\" on table \"{}\" must reference at least one column",
                owner, self.name
            )));
        }

        columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                if self.has_column(column) {
                    Ok(column.to_string())
                } else {
                    Err(Error::SchemaError(format!(
                        "There is no column with name \"{}\" on table \"{}\" (referenced by \"{}\")",
                        column, self.name, owner
                    )))
                }
            })
            .collect()
    }

    fn generate_name<S: AsRef<str>>(&self, columns: &[S], prefix: &str) -> String {
        let mut parts = vec![self.name.as_str()];
        parts.extend(columns.iter().map(AsRef::as_ref));
        generate_identifier_name(&parts, prefix, self.max_identifier_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::options::OptionValue;

    fn users_table() -> Table {
        let mut table = Table::new("users");
        table.add_column("id", "integer", Options::new()).unwrap();
        table.add_column("email", "string", Options::new()).unwrap();
        table
    }

    #[test]
    fn test_create_table_rejects_duplicates_case_insensitively() {
        let mut schema = Schema::default();
        schema.create_table("Users").unwrap();

        let err = schema.create_table("users").unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(schema.has_table("USERS"));
        assert_eq!(schema.table("users").unwrap().name(), "Users");
    }

    #[test]
    fn test_tables_inherit_default_options() {
        let mut config = SchemaConfig::default();
        config
            .default_table_options
            .insert("charset".to_string(), OptionValue::from("utf8mb4"));
        let mut schema = Schema::new(config);

        let table = schema.create_table("users").unwrap();
        assert_eq!(table.options().get("charset"), Some(&OptionValue::from("utf8mb4")));
    }

    #[test]
    fn test_tables_keep_insertion_order() {
        let mut schema = Schema::default();
        for name in ["zeta", "alpha", "mid"] {
            schema.create_table(name).unwrap();
        }

        let names: Vec<&str> = schema.tables().map(Table::name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_set_primary_key_forces_not_null() {
        let mut table = Table::new("t");
        table.add_column("id", "integer", Options::new()).unwrap();
        table.column_mut("id").unwrap().set_notnull(false);

        table.set_primary_key(&["id"]).unwrap();

        assert!(table.column("id").unwrap().notnull);
        let pk = table.primary_key().unwrap();
        assert_eq!(pk.name, PRIMARY_KEY_NAME);
        assert!(pk.is_primary && pk.is_unique);
        assert!(table.is_primary_key_column("ID"));
    }

    #[test]
    fn test_set_primary_key_requires_existing_columns() {
        let mut table = users_table();

        let err = table.set_primary_key(&["missing"]).unwrap_err();
        assert!(err.to_string().contains("\"missing\""));
        assert!(table.primary_key().is_none());
    }

    #[test]
    fn test_duplicate_column_is_rejected() {
        let mut table = users_table();

        assert!(table.add_column("ID", "integer", Options::new()).is_err());
    }

    #[test]
    fn test_add_index_generates_name() {
        let mut table = users_table();
        table.add_index(&["email"], None, vec![], Options::new()).unwrap();
        table.add_unique_index(&["email"], None, vec![], Options::new()).unwrap();

        let names: Vec<&str> = table.indexes().map(|i| i.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("IDX_"));
        assert!(names[1].starts_with("UNIQ_"));
    }

    #[test]
    fn test_duplicate_index_name_is_rejected() {
        let mut table = users_table();
        table.add_index(&["email"], Some("ix_email"), vec![], Options::new()).unwrap();

        let err = table
            .add_unique_index(&["email"], Some("IX_EMAIL"), vec![], Options::new())
            .unwrap_err();
        assert!(err.to_string().contains("already defined"));
    }

    #[test]
    fn test_foreign_key_checks_local_columns_only() {
        let mut table = users_table();
        table
            .add_foreign_key_constraint(&["id"], "accounts", &["account_id"], Options::new(), Some("fk_account"))
            .unwrap();

        let fk = table.foreign_key("FK_ACCOUNT").unwrap();
        assert_eq!(fk.foreign_table, "accounts");
        assert_eq!(fk.foreign_columns, vec!["account_id"]);

        assert!(table
            .add_foreign_key_constraint(&["nope"], "accounts", &["id"], Options::new(), None)
            .is_err());
        assert!(table
            .add_foreign_key_constraint(&["id", "email"], "accounts", &["id"], Options::new(), None)
            .is_err());
    }

    #[test]
    fn test_foreign_key_generated_name() {
        let mut table = users_table();
        table
            .add_foreign_key_constraint(&["id"], "accounts", &["id"], Options::new(), None)
            .unwrap();

        assert!(table.foreign_keys().next().unwrap().name.starts_with("FK_"));
    }

    #[test]
    fn test_drop_table_keeps_order() {
        let mut schema = Schema::default();
        for name in ["a", "b", "c"] {
            schema.create_table(name).unwrap();
        }

        assert!(schema.drop_table("B").is_some());
        let names: Vec<&str> = schema.tables().map(Table::name).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
