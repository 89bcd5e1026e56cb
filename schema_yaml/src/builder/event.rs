//! Schema build event and contributors

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::importer::SchemaImporter;
use crate::schema::types::Schema;

/// Event passed to every contributor while a schema is built
pub struct SchemaBuilderEvent<'a> {
    importer: &'a dyn SchemaImporter,
    schema: &'a mut Schema,
}

impl<'a> SchemaBuilderEvent<'a> {
    pub(crate) fn new(importer: &'a dyn SchemaImporter, schema: &'a mut Schema) -> Self {
        Self { importer, schema }
    }

    pub fn schema(&self) -> &Schema {
        &*self.schema
    }

    /// The schema under construction; contributors mutate it in place
    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut *self.schema
    }

    /// Import a schema definition into the schema under construction
    pub fn import_schema_from_source(&mut self, source: &str) -> Result<()> {
        self.importer.import_source_into(source, self.schema)
    }

    /// Import a schema definition file into the schema under construction
    pub fn import_schema_from_file(&mut self, path: &Path) -> Result<()> {
        let source = fs::read_to_string(path)?;
        self.import_schema_from_source(&source)
    }
}

/// Populates the schema while it is built
pub trait SchemaContributor: Send + Sync {
    /// Contributors with a higher priority run first
    fn priority(&self) -> i32 {
        0
    }

    fn on_build_schema(&self, event: &mut SchemaBuilderEvent<'_>) -> Result<()>;
}

/// Contributor backed by a closure
pub struct FnContributor<F> {
    priority: i32,
    callback: F,
}

impl<F> FnContributor<F>
where
    F: Fn(&mut SchemaBuilderEvent<'_>) -> Result<()> + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self::with_priority(0, callback)
    }

    pub fn with_priority(priority: i32, callback: F) -> Self {
        Self { priority, callback }
    }
}

impl<F> SchemaContributor for FnContributor<F>
where
    F: Fn(&mut SchemaBuilderEvent<'_>) -> Result<()> + Send + Sync,
{
    fn priority(&self) -> i32 {
        self.priority
    }

    fn on_build_schema(&self, event: &mut SchemaBuilderEvent<'_>) -> Result<()> {
        (self.callback)(event)
    }
}

/// Contributor importing one schema definition file
#[derive(Debug, Clone)]
pub struct SchemaFileContributor {
    path: PathBuf,
    priority: i32,
}

impl SchemaFileContributor {
    pub fn new(path: impl Into<PathBuf>, priority: i32) -> Self {
        Self {
            path: path.into(),
            priority,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SchemaContributor for SchemaFileContributor {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn on_build_schema(&self, event: &mut SchemaBuilderEvent<'_>) -> Result<()> {
        debug!(path = %self.path.display(), "Importing schema file");
        let source = fs::read_to_string(&self.path).map_err(|e| {
            Error::ContributorError(format!(
                "Failed to read schema file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        event.import_schema_from_source(&source)
    }
}
