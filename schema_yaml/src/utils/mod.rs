//! Utilities for schema_yaml
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use logging::init_logging;
pub use naming::{generate_identifier_name, is_sql_keyword, normalize_identifier, quote_if_reserved};
