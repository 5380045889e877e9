/// Core Module for sqlease
///
/// This module contains the connection handles, the statement runner and the
/// shared error types.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{BootstrapCause, DriverError, MissingField, Result, SqleaseError, ValidationError};
