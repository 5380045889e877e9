/// SQLite Handle Module
///
/// File-backed databases: the `SqliteBuilder`, the validated `FileConfig`,
/// and the `Sqlite` handle that bootstraps the store on construction and
/// hands out fresh connections afterwards.

use crate::core::db::connection::Database;
use crate::core::db::query::split_statements;
use crate::core::{BootstrapCause, Result, SqleaseError};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Parameters identifying a SQLite store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Folder that holds the store file
    pub folder_path: PathBuf,
    /// Name of the store file inside `folder_path`
    pub file_name: String,
    /// Logical database name recorded on each connection
    pub database_name: Option<String>,
    /// Script applied once when the store is first created
    pub schema_script: Option<String>,
    /// Run `PRAGMA foreign_keys = ON` on every connection
    pub foreign_keys: bool,
}

impl FileConfig {
    /// Folder joined with the file name, before canonicalization
    pub fn store_path(&self) -> PathBuf {
        self.folder_path.join(&self.file_name)
    }
}

/// Staging object for a `Sqlite` handle.
///
/// # Examples
///
/// ```no_run
/// use sqlease::core::db::{SqliteBuilder, StatementRunner};
///
/// let db = SqliteBuilder::new()
///     .folder_path("/var/lib/app")
///     .file_name("app.db")
///     .schema_script("CREATE TABLE t (x TEXT)")
///     .foreign_keys(true)
///     .build()?;
/// db.write_update("INSERT INTO t (x) VALUES ('v')")?;
/// # Ok::<(), sqlease::core::SqleaseError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqliteBuilder {
    config: FileConfig,
}

impl SqliteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `new().folder_path(folder).file_name(file)`
    pub fn at(folder: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self::new().folder_path(folder).file_name(file_name)
    }

    pub fn folder_path(mut self, folder: impl Into<PathBuf>) -> Self {
        self.config.folder_path = folder.into();
        self
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.config.file_name = file_name.into();
        self
    }

    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.config.database_name = Some(name.into());
        self
    }

    /// Statements separated by standalone `SPLIT` lines, run only when the
    /// store file does not exist yet.
    pub fn schema_script(mut self, script: impl Into<String>) -> Self {
        self.config.schema_script = Some(script.into());
        self
    }

    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.config.foreign_keys = enabled;
        self
    }

    /// Bootstraps the store if needed and returns the handle.
    ///
    /// # Errors
    ///
    /// Returns `SqleaseError::Bootstrap` if the location is incomplete, the
    /// directory or store cannot be created, or a schema statement fails.
    pub fn build(self) -> Result<Sqlite> {
        Sqlite::open(self.config)
    }
}

/// Handle on a bootstrapped SQLite store.
#[derive(Debug, Clone)]
pub struct Sqlite {
    config: FileConfig,
    path: PathBuf,
}

impl Sqlite {
    pub fn builder() -> SqliteBuilder {
        SqliteBuilder::new()
    }

    /// Ensures the store exists, creating and scripting it if it does not.
    pub fn open(config: FileConfig) -> Result<Self> {
        let target = config.store_path();
        let bootstrap_err = |source| SqleaseError::Bootstrap {
            path: target.clone(),
            source,
        };

        if config.folder_path.as_os_str().is_empty() {
            return Err(bootstrap_err(BootstrapCause::MissingLocation("folder path")));
        }
        if config.file_name.is_empty() {
            return Err(bootstrap_err(BootstrapCause::MissingLocation("file name")));
        }

        if target.is_file() {
            debug!("Using existing store at {:?}", target);
        } else {
            create_store(&config, &target).map_err(bootstrap_err)?;
        }

        let path = fs::canonicalize(&target)
            .map_err(|e| bootstrap_err(BootstrapCause::Resolve(e)))?;

        Ok(Sqlite { config, path })
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    /// Absolute path of the store file
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Removes the store file.
    ///
    /// Returns `Ok(true)` if the file existed and was removed and `Ok(false)`
    /// if there was nothing to remove.
    pub fn delete_file(&self) -> Result<bool> {
        if !self.path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        info!("Deleted store {:?}", self.path);
        Ok(true)
    }
}

impl Database for Sqlite {
    type Session = Connection;

    fn connect(&self) -> Result<Connection> {
        open_connection(&self.config, &self.path).map_err(|e| SqleaseError::Connectivity {
            target: self.path.display().to_string(),
            source: Box::new(e),
        })
    }
}

/// Opens a connection with the per-connection settings applied.
fn open_connection(config: &FileConfig, path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    if !conn.is_autocommit() {
        warn!("Connection to {:?} is not in autocommit mode", path);
    }

    // SQLite only has the `main` namespace, so the logical name is informational.
    if let Some(name) = config.database_name.as_deref().filter(|n| !n.is_empty()) {
        debug!("Connected to {:?} as database '{}'", path, name);
    }

    if config.foreign_keys {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    }
    Ok(conn)
}

fn create_store(config: &FileConfig, target: &Path) -> std::result::Result<(), BootstrapCause> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(BootstrapCause::CreateDir)?;
    }

    let conn = open_connection(config, target).map_err(BootstrapCause::Open)?;
    info!("Created store at {:?}", target);

    let script = match config.schema_script.as_deref() {
        Some(script) if !script.trim().is_empty() => script,
        _ => return Ok(()),
    };

    for (index, statement) in split_statements(script).into_iter().enumerate() {
        debug!("Applying schema statement {}: {}", index, statement);
        conn.execute(statement, [])
            .map_err(|source| BootstrapCause::Statement { index, source })?;
    }
    Ok(())
}
