/// Database Module
///
/// This module provides the database layer of sqlease, organized into
/// focused submodules.
///
/// ## Architecture
///
/// - **Connection Interface** (`connection.rs`): the `Database` and `Session` traits and the `ResultSet` cursor
/// - **SQLite** (`sqlite.rs`): file-backed handle with store bootstrap
/// - **MySQL** (`mysql.rs`): validated network handle
/// - **Handle** (`handle.rs`): engine-agnostic configuration and handle
/// - **Statement Execution** (`query.rs`): split scripts and single-value reads
///
/// ## Error Handling
///
/// All database operations use the standardized `SqleaseError` type for consistent error propagation.
pub mod connection;
pub mod handle;
pub mod mysql;
pub mod query;
pub mod sqlite;

pub use self::connection::*;
pub use self::handle::*;
pub use self::mysql::{MySql, MySqlBuilder, NetworkConfig};
pub use self::query::*;
pub use self::sqlite::{FileConfig, Sqlite, SqliteBuilder};
