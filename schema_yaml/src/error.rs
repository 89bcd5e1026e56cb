//! Error types for schema_yaml

use thiserror::Error;

/// Result type for schema_yaml operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema_yaml
#[derive(Error, Debug)]
pub enum Error {
    /// Structurally invalid schema definition text
    #[error("Invalid schema configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Schema analysis error: {0}")]
    SchemaAnalysisError(String),

    #[error("Schema contributor error: {0}")]
    ContributorError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

impl Error {
    /// Build an `InvalidConfiguration` error for an unexpected set of keys at `location`
    pub(crate) fn unhandled_keys(location: &str, keys: &[&str], allowed: &[&str]) -> Self {
        Error::InvalidConfiguration(format!(
            "Unhandled property in schema configuration for \"{}\". \"{}\" keys are not allowed. Allowed keys: \"{}\".",
            location,
            keys.join("\", \""),
            allowed.join("\", \""),
        ))
    }

    /// Whether this error reports a malformed schema definition
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Error::InvalidConfiguration(_))
    }
}

/// Convert YAML errors to schema_yaml errors
impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to schema_yaml errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
