//! Schema export
//!
//! Serializes the schema model to the YAML schema definition format read by
//! [`crate::importer::YamlSchemaImporter`]. Tables, columns, indexes and
//! foreign keys keep the model's insertion order, so a schema always exports
//! to the same text.

mod table;

pub use table::{ColumnDefinition, ForeignKeyDefinition, IndexDefinition, TableDefinition, TableExporter};

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::schema::types::Schema;

/// Root of the exported document
#[derive(Debug, Default, Serialize)]
struct SchemaDefinition {
    tables: IndexMap<String, TableDefinition>,
}

/// Exports a [`Schema`] to YAML
#[derive(Debug, Clone, Default)]
pub struct SchemaExporter {
    table_exporter: TableExporter,
}

impl SchemaExporter {
    pub fn new(table_exporter: TableExporter) -> Self {
        Self { table_exporter }
    }

    /// Export the schema as a YAML document
    pub fn export(&self, schema: &Schema) -> Result<String> {
        let tables = schema
            .tables()
            .map(|table| (table.name().to_string(), self.table_exporter.export(table)))
            .collect();

        Ok(serde_yaml::to_string(&SchemaDefinition { tables })?)
    }

    /// Export the schema and write it to `path`
    pub fn export_to_file(&self, schema: &Schema, path: &Path) -> Result<()> {
        let yaml = self.export(schema)?;
        fs::write(path, yaml)?;
        info!(path = %path.display(), tables = schema.tables().count(), "Exported schema");
        Ok(())
    }
}
