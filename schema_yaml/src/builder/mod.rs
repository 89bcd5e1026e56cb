//! Schema assembly
//!
//! The [`SchemaBuilder`] creates the schema every command works on. Registered
//! contributors populate it in priority order, and a schema definition file
//! can be imported on top of what they built.

mod event;

pub use event::{FnContributor, SchemaBuilderEvent, SchemaContributor, SchemaFileContributor};

use std::cmp::Reverse;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::importer::{SchemaImporter, YamlSchemaImporter};
use crate::schema::options::Options;
use crate::schema::types::{Schema, SchemaConfig};

/// Builds schemas from registered contributors and imported files
pub struct SchemaBuilder {
    importer: Box<dyn SchemaImporter>,
    contributors: Vec<Box<dyn SchemaContributor>>,
    default_table_options: Options,
    /// Schema produced by the last build, target of later imports
    schema: Option<Schema>,
}

impl SchemaBuilder {
    pub fn new(importer: Box<dyn SchemaImporter>, default_table_options: Options) -> Self {
        Self {
            importer,
            contributors: Vec::new(),
            default_table_options,
            schema: None,
        }
    }

    /// Builder using the YAML importer, the configured default table options
    /// and one contributor per configured schema file
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new(Box::new(YamlSchemaImporter), config.tables.options.clone());
        for file in &config.schema.files {
            builder.add_contributor(Box::new(SchemaFileContributor::new(
                file.path.clone(),
                file.priority,
            )));
        }
        builder
    }

    /// Register a contributor; equal priorities keep registration order
    pub fn add_contributor(&mut self, contributor: Box<dyn SchemaContributor>) -> &mut Self {
        self.contributors.push(contributor);
        self.contributors
            .sort_by_key(|contributor| Reverse(contributor.priority()));
        self
    }

    pub fn contributor_count(&self) -> usize {
        self.contributors.len()
    }

    fn new_schema(&self) -> Schema {
        Schema::new(SchemaConfig {
            default_table_options: self.default_table_options.clone(),
            ..SchemaConfig::default()
        })
    }

    /// Build a new schema and let every contributor populate it
    ///
    /// The first contributor error aborts the build and is returned as is; the
    /// previously built schema is kept in that case.
    pub fn build_schema(&mut self) -> Result<&Schema> {
        let mut schema = self.new_schema();

        for contributor in &self.contributors {
            debug!(priority = contributor.priority(), "Running schema contributor");
            let mut event = SchemaBuilderEvent::new(self.importer.as_ref(), &mut schema);
            contributor.on_build_schema(&mut event)?;
        }

        info!(
            contributors = self.contributor_count(),
            tables = schema.tables().count(),
            "Built schema"
        );
        Ok(&*self.schema.insert(schema))
    }

    /// Import a schema definition file into the last built schema
    ///
    /// Without a prior build, the file is imported into a new empty schema.
    pub fn import_schema_from_file(&mut self, path: &Path) -> Result<&Schema> {
        let source = fs::read_to_string(path)?;
        self.import_schema_from_source(&source)
    }

    /// Import a schema definition into the last built schema
    pub fn import_schema_from_source(&mut self, source: &str) -> Result<&Schema> {
        let schema = match self.schema.take() {
            Some(schema) => schema,
            None => self.new_schema(),
        };
        let schema = self.schema.insert(schema);
        self.importer.import_source_into(source, schema)?;
        Ok(&*schema)
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Release the current schema
    pub fn take_schema(&mut self) -> Option<Schema> {
        self.schema.take()
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new(Box::new(YamlSchemaImporter), Options::new())
    }
}
