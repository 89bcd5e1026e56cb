//! Database module for schema_yaml
//!
//! This module handles connections to the live database being compared.

pub mod connection;

// Re-export key types
pub use connection::{Connection, DatabaseConnection};
