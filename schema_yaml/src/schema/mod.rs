//! Schema module for schema_yaml
//!
//! This module holds the in-memory schema model, its comparison and the
//! introspection of live databases into it.

pub mod analyzer;
pub mod column;
pub mod diff;
pub mod index;
pub mod options;
pub mod types;

// Re-export key types
pub use analyzer::SchemaAnalyzer;
pub use column::Column;
pub use diff::{ColumnDiff, ColumnProperty, Comparator, SchemaDiff, TableDiff};
pub use index::{ForeignKey, Index};
pub use options::{OptionValue, Options};
pub use types::{Schema, SchemaConfig, Table, PRIMARY_KEY_NAME};
