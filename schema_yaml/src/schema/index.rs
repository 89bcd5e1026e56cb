//! Index and foreign key constraint definitions

use crate::schema::options::{OptionValue, Options};

/// Represents an index, a unique constraint or the primary key
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: String,
    /// Column names in physical index order
    pub columns: Vec<String>,
    pub is_unique: bool,
    pub is_primary: bool,
    pub flags: Vec<String>,
    pub options: Options,
}

impl Index {
    pub fn new(name: &str, columns: Vec<String>, is_unique: bool, is_primary: bool) -> Self {
        Self {
            name: name.to_string(),
            columns,
            is_unique,
            is_primary,
            flags: Vec::new(),
            options: Options::new(),
        }
    }

    /// Whether the index covers exactly the given columns in the same order
    pub fn spans_columns(&self, columns: &[String]) -> bool {
        self.columns.len() == columns.len()
            && self
                .columns
                .iter()
                .zip(columns)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    /// Per-column prefix lengths from the `lengths` option
    pub fn lengths(&self) -> Vec<Option<u32>> {
        self.options
            .get("lengths")
            .and_then(OptionValue::as_list)
            .map(|items| items.iter().map(OptionValue::as_u32).collect())
            .unwrap_or_default()
    }
}

/// Represents a foreign key constraint
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub name: String,
    pub local_columns: Vec<String>,
    pub foreign_table: String,
    /// Referenced columns, positionally paired with `local_columns`
    pub foreign_columns: Vec<String>,
    pub options: Options,
}

impl ForeignKey {
    pub fn on_delete(&self) -> Option<&str> {
        self.referential_action("onDelete")
    }

    pub fn on_update(&self) -> Option<&str> {
        self.referential_action("onUpdate")
    }

    fn referential_action(&self, key: &str) -> Option<&str> {
        self.options
            .get(key)
            .and_then(OptionValue::as_str)
            .filter(|action| !action.eq_ignore_ascii_case("NO ACTION"))
    }

    /// Column pairs `(local, foreign)` in declaration order
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.local_columns
            .iter()
            .map(String::as_str)
            .zip(self.foreign_columns.iter().map(String::as_str))
    }
}
