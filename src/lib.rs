// Core infrastructure modules
pub mod core;

// Configuration file support
pub mod config;

pub use crate::core::db::{
    ConnectionConfig, Database, DatabaseHandle, MySql, MySqlBuilder, ResultSet, Session, Sqlite,
    SqliteBuilder, StatementRunner,
};
pub use crate::core::{Result, SqleaseError};

#[cfg(test)]
mod test_utils;
