//! Schema import
//!
//! Importers turn a textual schema definition into the in-memory [`Schema`]
//! model, either as a new schema or merged into an existing one.

mod yaml;

pub use yaml::YamlSchemaImporter;

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::schema::types::Schema;

/// Import a schema definition into the schema model
pub trait SchemaImporter: Send + Sync {
    /// Import `source` into `schema`
    ///
    /// Tables are added one at a time; when a table fails to import, the
    /// tables imported before it stay in `schema`.
    fn import_source_into(&self, source: &str, schema: &mut Schema) -> Result<()>;

    /// Import `source` into `target`, or into a new schema if there is none
    fn import_from_source(&self, source: &str, target: Option<Schema>) -> Result<Schema> {
        let mut schema = target.unwrap_or_default();
        self.import_source_into(source, &mut schema)?;
        Ok(schema)
    }

    /// Import the file at `path`, see [`SchemaImporter::import_from_source`]
    fn import_from_file(&self, path: &Path, target: Option<Schema>) -> Result<Schema> {
        let source = fs::read_to_string(path)?;
        self.import_from_source(&source, target)
    }
}
