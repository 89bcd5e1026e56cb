//! Database connection handling
//!
//! This module establishes the connection used to introspect a live database.

use std::str::FromStr;
use std::time::Duration;

use sqlx::{
    mysql::MySqlPoolOptions,
    postgres::PgPoolOptions,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    MySql, Pool, Postgres, Sqlite,
};
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::platform::{DbPlatform, DbPlatformFactory};

/// Enumeration of supported database connections
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    Postgres(Pool<Postgres>),
    MySql(Pool<MySql>),
    Sqlite(Pool<Sqlite>),
}

/// Driver families a connection can be opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Driver {
    Postgres,
    MySql,
    Sqlite,
}

impl Driver {
    /// Resolve a configured driver name, accepting the sqlx and PDO spellings
    fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pdo_pgsql" => Ok(Driver::Postgres),
            "mysql" | "pdo_mysql" => Ok(Driver::MySql),
            "sqlite" | "pdo_sqlite" => Ok(Driver::Sqlite),
            _ => Err(Error::DatabaseError(format!(
                "Unsupported database driver: {}",
                name
            ))),
        }
    }
}

/// Open connection plus the settings it was opened with
#[derive(Debug, Clone)]
pub struct Connection {
    pool: DatabaseConnection,
    driver: String,
    schema: Option<String>,
}

impl Connection {
    /// Create a new database connection from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool_size = config.pool_size.unwrap_or(5);
        let timeout = Duration::from_secs(config.timeout_seconds.unwrap_or(30));

        debug!(driver = %config.driver, "Connecting to database");
        let pool = match Driver::from_name(&config.driver)? {
            Driver::Postgres => DatabaseConnection::Postgres(
                PgPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?,
            ),
            Driver::MySql => DatabaseConnection::MySql(
                MySqlPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?,
            ),
            Driver::Sqlite => {
                let options = SqliteConnectOptions::from_str(&config.url)?.foreign_keys(true);
                DatabaseConnection::Sqlite(
                    SqlitePoolOptions::new()
                        .max_connections(pool_size)
                        .acquire_timeout(timeout)
                        .connect_with(options)
                        .await?,
                )
            }
        };

        Ok(Self {
            pool,
            driver: config.driver.clone(),
            schema: config.schema.clone(),
        })
    }

    pub fn pool(&self) -> &DatabaseConnection {
        &self.pool
    }

    /// Configured database schema, if any
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Platform matching the connection driver
    pub fn platform<'a>(&self, factory: &'a DbPlatformFactory) -> Result<&'a dyn DbPlatform> {
        factory.from_driver_name(&self.driver).ok_or_else(|| {
            Error::PlatformError(format!(
                "No platform available for database driver \"{}\"",
                self.driver
            ))
        })
    }
}
