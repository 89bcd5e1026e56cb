//! schema_yaml: relational database schemas described in YAML
//!
//! schema_yaml imports a declarative YAML schema definition into an in-memory
//! schema model, exports a model back to the same format and renders it as DDL
//! for PostgreSQL, MySQL/MariaDB and SQLite, optionally as the difference
//! against a live database.

pub mod builder;
pub mod config;
pub mod db;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod platform;
pub mod schema;
pub mod utils;

// Re-export main types for easier access
pub use builder::{FnContributor, SchemaBuilder, SchemaBuilderEvent, SchemaContributor, SchemaFileContributor};
pub use config::Config;
pub use db::connection::{Connection, DatabaseConnection};
pub use error::{Error, Result};
pub use exporter::{SchemaExporter, TableExporter};
pub use importer::{SchemaImporter, YamlSchemaImporter};
pub use platform::{DbPlatform, DbPlatformFactory};
pub use schema::analyzer::SchemaAnalyzer;
pub use schema::diff::{Comparator, SchemaDiff};
pub use schema::types::{Schema, SchemaConfig, Table};

/// Load the configuration file and initialize logging from it
pub fn init(config_path: &str) -> Result<Config> {
    let config = config::load_from_file(config_path)?;
    utils::logging::init_logging(&config.logging)?;
    Ok(config)
}

/// Statements turning the live database described by `connection` into `schema`
pub async fn diff_against_database(
    connection: Connection,
    schema: &Schema,
    platform: &dyn DbPlatform,
) -> Result<Vec<String>> {
    let current = SchemaAnalyzer::new(connection).analyze().await?;
    let diff = Comparator::compare_schemas(&current, schema);

    if diff.is_empty() {
        tracing::info!("Database schema is already in sync");
        return Ok(Vec::new());
    }

    platform.alter_schema_sql(&diff)
}
