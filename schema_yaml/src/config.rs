//! Configuration handling for schema_yaml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::schema::options::Options;

/// Load configuration from a TOML file
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Represents the complete schema_yaml configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub database: Option<DatabaseConfig>,
    pub tables: TablesConfig,
    pub schema: SchemaFilesConfig,
    pub logging: LoggingConfig,
}

/// Database connection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub driver: String,
    pub url: String,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub schema: Option<String>,
}

/// Settings applied to every table of a built schema
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TablesConfig {
    /// Default table options, e.g. `charset`, `collate` and `engine` on MySQL
    pub options: Options,
}

/// Schema definition files contributed to every built schema
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SchemaFilesConfig {
    pub files: Vec<SchemaFileConfig>,
}

/// One contributed schema file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchemaFileConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub priority: i32,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
    pub file: Option<PathBuf>,
    /// Log to stdout instead of stderr
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "text".to_string(),
            file: None,
            stdout: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::options::OptionValue;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
[database]
driver = "postgres"
url = "postgres://localhost/app"
pool_size = 2

[tables.options]
charset = "utf8mb4"
engine = "InnoDB"

[[schema.files]]
path = "config/schema.yaml"
priority = 10

[[schema.files]]
path = "config/extra.yaml"

[logging]
level = "debug"
format = "json"
"#,
        );

        let config = load_from_file(file.path()).unwrap();

        let database = config.database.unwrap();
        assert_eq!(database.driver, "postgres");
        assert_eq!(database.pool_size, Some(2));
        assert_eq!(database.timeout_seconds, None);
        assert_eq!(
            config.tables.options.get("charset"),
            Some(&OptionValue::from("utf8mb4"))
        );
        assert_eq!(config.schema.files.len(), 2);
        assert_eq!(config.schema.files[0].priority, 10);
        assert_eq!(config.schema.files[1].priority, 0);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert!(!config.logging.stdout);
    }

    #[test]
    fn test_every_section_is_optional() {
        let file = write_config("");

        let config = load_from_file(file.path()).unwrap();

        assert!(config.database.is_none());
        assert!(config.tables.options.is_empty());
        assert!(config.schema.files.is_empty());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_invalid_config() {
        let file = write_config("[database]\ndriver = 1\n");

        let err = load_from_file(file.path()).unwrap_err();

        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_from_file("/nonexistent/schema_yaml.toml").unwrap_err();

        assert!(matches!(err, Error::ConfigError(_)));
    }
}
