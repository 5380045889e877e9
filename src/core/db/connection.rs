/// Connection Module
///
/// This module defines the narrow interface sqlease consumes from a database
/// driver: something that can open sessions (`Database`), sessions that can
/// run statements and queries (`Session`), and the row cursor returned by
/// queries (`ResultSet`).

use crate::core::{DriverError, Result};
use rusqlite::types::ValueRef;
use serde::Serialize;

/// A source of fresh connections.
///
/// Every call to `connect` opens a brand-new session; implementations never
/// pool or cache connections. Dropping the session closes it.
pub trait Database {
    /// The live connection type handed out by this database
    type Session: Session;

    /// Opens a new connection against the validated configuration
    fn connect(&self) -> Result<Self::Session>;
}

/// An open connection able to run single statements.
pub trait Session {
    /// Executes one statement that returns no rows and yields the number of
    /// affected rows.
    fn execute(&mut self, sql: &str) -> std::result::Result<u64, DriverError>;

    /// Executes one query and buffers its rows into a `ResultSet`.
    fn query(&mut self, sql: &str) -> std::result::Result<ResultSet, DriverError>;
}

impl<S: Session + ?Sized> Session for Box<S> {
    fn execute(&mut self, sql: &str) -> std::result::Result<u64, DriverError> {
        (**self).execute(sql)
    }

    fn query(&mut self, sql: &str) -> std::result::Result<ResultSet, DriverError> {
        (**self).query(sql)
    }
}

// With `extra_check`, a statement after the first `;` is an error rather than
// silently dropped. Scripts separate statements with `SPLIT` lines.
impl Session for rusqlite::Connection {
    fn execute(&mut self, sql: &str) -> std::result::Result<u64, DriverError> {
        let changed = rusqlite::Connection::execute(self, sql, [])?;
        Ok(changed as u64)
    }

    fn query(&mut self, sql: &str) -> std::result::Result<ResultSet, DriverError> {
        let mut stmt = self.prepare(sql)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = stmt.column_count();

        let rows = stmt
            .query_map([], |row| {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(sqlite_value(row.get_ref(i)?));
                }
                Ok(values)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ResultSet::new(columns, rows))
    }
}

/// Renders a SQLite value the way a string column accessor would.
fn sqlite_value(value: ValueRef) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}

/// Rows returned by a query, with a forward-only cursor.
///
/// The cursor starts before the first row; call `advance` to move onto a
/// row, then read columns by zero-based ordinal. NULL values read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    #[serde(skip)]
    position: usize,
}

impl ResultSet {
    /// Creates a new ResultSet from column names and row data
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        ResultSet {
            columns,
            rows,
            position: 0,
        }
    }

    /// Column names in select order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Moves to the next row, returning `false` once the rows are exhausted.
    pub fn advance(&mut self) -> bool {
        if self.position < self.rows.len() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// The row the cursor is on, if `advance` has landed on one
    pub fn current_row(&self) -> Option<&[Option<String>]> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .map(Vec::as_slice)
    }

    /// String value of a column on the current row.
    ///
    /// Returns `None` when there is no current row, the ordinal is out of
    /// range, or the value is NULL.
    pub fn get_string(&self, ordinal: usize) -> Option<&str> {
        self.current_row()?.get(ordinal)?.as_deref()
    }

    /// First column of the first row, independent of the cursor position.
    ///
    /// The outer `Option` is `None` when there are no rows; the inner one is
    /// `None` for a NULL value.
    pub fn first_value(&self) -> Option<Option<&str>> {
        let row = self.rows.first()?;
        Some(row.first().and_then(|v| v.as_deref()))
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Option<String>>> {
        self.rows
    }
}
