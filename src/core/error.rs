/// sqlease Error Module
///
/// This module defines the error types shared by the configuration builders,
/// the store bootstrap and the statement runner.
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error reported by an underlying database driver.
///
/// Boxed so that the same variants can carry `rusqlite` and `mysql` failures.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Comprehensive error type for sqlease.
///
/// The variants follow the life of a handle:
/// - building a configuration (`Validation`)
/// - creating the backing store (`Bootstrap`)
/// - opening connections (`Connectivity`)
/// - running statements (`Statement`)
#[derive(Error, Debug)]
pub enum SqleaseError {
    /// Required connection fields were missing at build time
    #[error("Configuration error:\n{0}")]
    Validation(#[from] ValidationError),

    /// The backing store could not be created or initialised
    #[error("Bootstrap error for {path:?}: {source}")]
    Bootstrap {
        path: PathBuf,
        #[source]
        source: BootstrapCause,
    },

    /// A connection could not be opened
    #[error("Connection error ({target}): {source}")]
    Connectivity {
        target: String,
        #[source]
        source: DriverError,
    },

    /// A submitted statement failed; `index` is its position in the split script
    #[error("Statement error (statement {index}): {source}")]
    Statement {
        index: usize,
        statement: String,
        #[source]
        source: DriverError,
    },

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file loading errors
    #[error("Configuration file error: {0}")]
    Config(String),
}

/// Type alias for Result to use SqleaseError as the error type.
pub type Result<T> = std::result::Result<T, SqleaseError>;

/// Why a store bootstrap failed.
#[derive(Error, Debug)]
pub enum BootstrapCause {
    /// No folder path or no file name was configured
    #[error("no {0} provided")]
    MissingLocation(&'static str),

    /// The parent directory could not be created
    #[error("could not create directory: {0}")]
    CreateDir(#[source] std::io::Error),

    /// The store path could not be resolved to an absolute path
    #[error("could not resolve store path: {0}")]
    Resolve(#[source] std::io::Error),

    /// The store could not be opened or created
    #[error("could not open store: {0}")]
    Open(#[source] rusqlite::Error),

    /// A statement of the bootstrap script failed
    #[error("schema statement {index} failed: {source}")]
    Statement {
        index: usize,
        #[source]
        source: rusqlite::Error,
    },
}

/// A required network connection field that was not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Host,
    Port,
    Username,
    /// Neither a password nor a password environment variable
    Password,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MissingField::Host => "No host provided",
            MissingField::Port => "No port number provided",
            MissingField::Username => "No username provided",
            MissingField::Password => "No password provided",
        };
        f.write_str(msg)
    }
}

/// Every missing field found while validating a network configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    missing: Vec<MissingField>,
}

impl ValidationError {
    pub(crate) fn new(missing: Vec<MissingField>) -> Self {
        ValidationError { missing }
    }

    /// The missing fields, in host, port, username, password order
    pub fn missing(&self) -> &[MissingField] {
        &self.missing
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.missing {
            writeln!(f, "\t- {}", field)?;
        }
        Ok(())
    }
}
