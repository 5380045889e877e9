/// # Test Utilities Module
///
/// Shared fixtures for unit tests: every fixture owns a temporary directory
/// that is removed when the fixture is dropped.

use crate::core::db::SqliteBuilder;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two independent tables separated by a standalone `SPLIT` line.
pub const TWO_TABLE_SCHEMA: &str = "CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
)
SPLIT
CREATE TABLE items (
    id INTEGER PRIMARY KEY,
    label TEXT NOT NULL
)";

/// File name used for fixture stores
pub const STORE_FILE: &str = "store.db";

/// Isolated store location in a fresh temporary directory
pub struct StoreFixture {
    dir: TempDir,
}

impl StoreFixture {
    pub fn new() -> Self {
        StoreFixture {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Where the fixture store lives (whether or not it exists yet)
    pub fn store_path(&self) -> PathBuf {
        self.dir().join(STORE_FILE)
    }

    /// Builder pointed at the fixture store
    pub fn builder(&self) -> SqliteBuilder {
        SqliteBuilder::at(self.dir(), STORE_FILE)
    }
}
