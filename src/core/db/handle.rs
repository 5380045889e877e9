/// Engine-agnostic configuration and handle.
///
/// Used when the engine is only known at runtime, for example when it comes
/// from a configuration file.

use crate::core::db::connection::{Database, Session};
use crate::core::db::mysql::{MySql, MySqlBuilder, NetworkConfig};
use crate::core::db::sqlite::{FileConfig, Sqlite, SqliteBuilder};
use crate::core::Result;
#[cfg(not(feature = "mysql"))]
use crate::core::SqleaseError;

/// Connection parameters for either engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionConfig {
    /// MySQL server
    Network(NetworkConfig),
    /// SQLite store file
    File(FileConfig),
}

impl ConnectionConfig {
    /// Validates (network) or bootstraps (file) and returns the handle.
    ///
    /// # Errors
    ///
    /// Besides validation and bootstrap failures, a network configuration is
    /// rejected with `SqleaseError::Config` when the crate is built without
    /// the `mysql` feature. Validation errors are reported first.
    pub fn open(self) -> Result<DatabaseHandle> {
        match self {
            ConnectionConfig::Network(config) => {
                let db = MySqlBuilder::from(config).build()?;
                Ok(DatabaseHandle::MySql(supported(db)?))
            }
            ConnectionConfig::File(config) => {
                Ok(DatabaseHandle::Sqlite(SqliteBuilder::from(config).build()?))
            }
        }
    }
}

/// Passes a network handle through only when it can connect in this build.
#[cfg(feature = "mysql")]
fn supported(db: MySql) -> Result<MySql> {
    Ok(db)
}

#[cfg(not(feature = "mysql"))]
fn supported(db: MySql) -> Result<MySql> {
    Err(without_mysql(&db))
}

#[cfg(not(feature = "mysql"))]
fn without_mysql(db: &MySql) -> SqleaseError {
    SqleaseError::Config(format!(
        "cannot use {}: built without the `mysql` feature",
        db.connection_url()
    ))
}

impl From<NetworkConfig> for MySqlBuilder {
    fn from(config: NetworkConfig) -> Self {
        let builder = MySqlBuilder::new()
            .host(config.host)
            .port(config.port)
            .username(config.username);
        let builder = match config.schema {
            Some(schema) => builder.schema(schema),
            None => builder,
        };
        let builder = match config.password {
            Some(password) => builder.password(password),
            None => builder,
        };
        match config.password_env {
            Some(var) => builder.password_env(var),
            None => builder,
        }
    }
}

impl From<FileConfig> for SqliteBuilder {
    fn from(config: FileConfig) -> Self {
        let builder = SqliteBuilder::at(config.folder_path, config.file_name)
            .foreign_keys(config.foreign_keys);
        let builder = match config.database_name {
            Some(name) => builder.database_name(name),
            None => builder,
        };
        match config.schema_script {
            Some(script) => builder.schema_script(script),
            None => builder,
        }
    }
}

/// A handle on either engine.
#[derive(Debug, Clone)]
pub enum DatabaseHandle {
    MySql(MySql),
    Sqlite(Sqlite),
}

impl DatabaseHandle {
    /// Engine name, for diagnostics
    pub fn engine(&self) -> &'static str {
        match self {
            DatabaseHandle::MySql(_) => "mysql",
            DatabaseHandle::Sqlite(_) => "sqlite",
        }
    }

    pub fn as_sqlite(&self) -> Option<&Sqlite> {
        match self {
            DatabaseHandle::Sqlite(db) => Some(db),
            DatabaseHandle::MySql(_) => None,
        }
    }

    pub fn as_mysql(&self) -> Option<&MySql> {
        match self {
            DatabaseHandle::MySql(db) => Some(db),
            DatabaseHandle::Sqlite(_) => None,
        }
    }
}

impl Database for DatabaseHandle {
    type Session = Box<dyn Session>;

    fn connect(&self) -> Result<Box<dyn Session>> {
        match self {
            DatabaseHandle::Sqlite(db) => Ok(Box::new(db.connect()?)),
            #[cfg(feature = "mysql")]
            DatabaseHandle::MySql(db) => Ok(Box::new(db.connect()?)),
            #[cfg(not(feature = "mysql"))]
            DatabaseHandle::MySql(db) => Err(without_mysql(db)),
        }
    }
}
