//! Per-table export

use indexmap::IndexMap;
use serde::Serialize;

use crate::schema::column::Column;
use crate::schema::index::{ForeignKey, Index};
use crate::schema::options::{OptionValue, Options};
use crate::schema::types::Table;

/// Foreign key options that are platform defaults when `false`
const FOREIGN_KEY_DEFAULT_OPTIONS: &[&str] = &["deferrable", "deferred"];

/// Exported table definition
///
/// Field order is the key order of the generated document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableDefinition {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub indexes: IndexMap<String, IndexDefinition>,
    #[serde(rename = "uniqueConstraints", skip_serializing_if = "IndexMap::is_empty")]
    pub unique_constraints: IndexMap<String, IndexDefinition>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub id: IndexMap<String, ColumnDefinition>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, ColumnDefinition>,
    #[serde(rename = "foreignKeys", skip_serializing_if = "IndexMap::is_empty")]
    pub foreign_keys: IndexMap<String, ForeignKeyDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDefinition {
    #[serde(rename = "type")]
    pub type_name: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(skip_serializing_if = "Options::is_empty")]
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDefinition {
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Options::is_empty")]
    pub options: Options,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKeyDefinition {
    pub fields: Vec<String>,
    #[serde(rename = "foreignTable")]
    pub foreign_table: String,
    #[serde(rename = "foreignFields")]
    pub foreign_fields: Vec<String>,
    pub options: Options,
}

/// Exports a [`Table`] to its definition
#[derive(Debug, Clone, Copy, Default)]
pub struct TableExporter;

impl TableExporter {
    pub fn new() -> Self {
        Self
    }

    pub fn export(&self, table: &Table) -> TableDefinition {
        let mut definition = TableDefinition::default();

        self.export_indexes(&mut definition, table);
        self.export_columns(&mut definition, table);
        self.export_foreign_keys(&mut definition, table);

        definition
    }

    fn export_indexes(&self, definition: &mut TableDefinition, table: &Table) {
        // The primary key is exported through the `id` section
        for index in table.indexes().filter(|index| !index.is_primary) {
            let group = if index.is_unique {
                &mut definition.unique_constraints
            } else {
                &mut definition.indexes
            };
            group.insert(index.name.clone(), Self::index_definition(index));
        }
    }

    fn index_definition(index: &Index) -> IndexDefinition {
        let mut options = index.options.clone();
        // lengths carry nothing when every entry is null
        let only_null_lengths = options
            .get("lengths")
            .and_then(OptionValue::as_list)
            .is_some_and(|lengths| !lengths.is_empty() && lengths.iter().all(OptionValue::is_null));
        if only_null_lengths {
            options.shift_remove("lengths");
        }

        IndexDefinition {
            fields: index.columns.clone(),
            options,
            flags: index.flags.clone(),
        }
    }

    fn export_columns(&self, definition: &mut TableDefinition, table: &Table) {
        for column in table.columns() {
            let group = if table.is_primary_key_column(&column.name) {
                &mut definition.id
            } else {
                &mut definition.fields
            };
            group.insert(column.name.clone(), Self::column_definition(column));
        }
    }

    fn column_definition(column: &Column) -> ColumnDefinition {
        let mut options = Options::new();
        if let Some(default) = &column.default {
            options.insert("default".to_string(), default.clone());
        }
        if column.autoincrement {
            options.insert("autoincrement".to_string(), true.into());
        }

        ColumnDefinition {
            type_name: column.type_name.clone(),
            nullable: !column.notnull,
            length: column.length,
            options,
        }
    }

    fn export_foreign_keys(&self, definition: &mut TableDefinition, table: &Table) {
        for fk in table.foreign_keys() {
            definition
                .foreign_keys
                .insert(fk.name.clone(), Self::foreign_key_definition(fk));
        }
    }

    fn foreign_key_definition(fk: &ForeignKey) -> ForeignKeyDefinition {
        let mut options = fk.options.clone();
        for key in FOREIGN_KEY_DEFAULT_OPTIONS {
            if options.get(*key) == Some(&OptionValue::Bool(false)) {
                options.shift_remove(*key);
            }
        }

        ForeignKeyDefinition {
            fields: fk.local_columns.clone(),
            foreign_table: fk.foreign_table.clone(),
            foreign_fields: fk.foreign_columns.clone(),
            options,
        }
    }
}
