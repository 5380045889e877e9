use crate::core::db::{ConnectionConfig, DatabaseHandle, FileConfig, NetworkConfig};
use crate::core::{Result, SqleaseError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level configuration structure parsed from a TOML file.
///
/// Exactly one of the `[sqlite]` and `[mysql]` sections must be present.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub sqlite: Option<SqliteConfig>,
    pub mysql: Option<MySqlConfig>,
    /// Directory of the file the configuration was loaded from
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// SQLite store configuration.
#[derive(Debug, Deserialize)]
pub struct SqliteConfig {
    pub folder: PathBuf,
    pub file_name: String,
    pub database_name: Option<String>,
    /// Inline bootstrap script
    pub schema: Option<String>,
    /// Bootstrap script file, relative to the configuration file
    pub schema_file: Option<PathBuf>,
    #[serde(default)]
    pub foreign_keys: bool,
}

/// MySQL server configuration. Omitted host and port fall back to
/// `localhost:3306`.
#[derive(Debug, Deserialize)]
pub struct MySqlConfig {
    pub host: Option<String>,
    pub port: Option<Port>,
    pub schema: Option<String>,
    #[serde(default)]
    pub username: String,
    pub password: Option<String>,
    pub password_env: Option<String>,
}

/// A port written either as a number or as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Port {
    Number(u16),
    Text(String),
}

impl Port {
    fn into_string(self) -> String {
        match self {
            Port::Number(n) => n.to_string(),
            Port::Text(s) => s,
        }
    }
}

impl Config {
    /// Resolves the configured section into connection parameters.
    ///
    /// A `schema_file` is read here, relative to `base_dir` when it is not
    /// absolute; an inline `schema` takes precedence over it.
    pub fn connection(self) -> Result<ConnectionConfig> {
        match (self.sqlite, self.mysql) {
            (Some(sqlite), None) => {
                let schema_script = match (sqlite.schema, sqlite.schema_file) {
                    (Some(script), _) => Some(script),
                    (None, Some(file)) => {
                        let path = match &self.base_dir {
                            Some(base) if file.is_relative() => base.join(file),
                            _ => file,
                        };
                        debug!("Reading schema script from {:?}", path);
                        Some(fs::read_to_string(path)?)
                    }
                    (None, None) => None,
                };
                Ok(ConnectionConfig::File(FileConfig {
                    folder_path: sqlite.folder,
                    file_name: sqlite.file_name,
                    database_name: sqlite.database_name,
                    schema_script,
                    foreign_keys: sqlite.foreign_keys,
                }))
            }
            (None, Some(mysql)) => {
                let defaults = NetworkConfig::default();
                Ok(ConnectionConfig::Network(NetworkConfig {
                    host: mysql.host.unwrap_or(defaults.host),
                    port: mysql.port.map(Port::into_string).unwrap_or(defaults.port),
                    schema: mysql.schema,
                    username: mysql.username,
                    password: mysql.password,
                    password_env: mysql.password_env,
                }))
            }
            (Some(_), Some(_)) => Err(SqleaseError::Config(
                "both [sqlite] and [mysql] sections are present".to_string(),
            )),
            (None, None) => Err(SqleaseError::Config(
                "no [sqlite] or [mysql] section found".to_string(),
            )),
        }
    }

    /// Builds the configured handle, bootstrapping a SQLite store if needed.
    pub fn open(self) -> Result<DatabaseHandle> {
        self.connection()?.open()
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| SqleaseError::Config(e.to_string()))
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// use sqlease::config::load_config;
///
/// let handle = load_config("sqlease.toml")?.open()?;
/// # Ok::<(), sqlease::SqleaseError>(())
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    config.base_dir = path.parent().map(Path::to_path_buf);
    Ok(config)
}

/// `<config dir>/sqlease/config.toml`, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sqlease").join("config.toml"))
}
