/// Statement Execution Module
///
/// Split-script execution and single-value reads on top of any `Database`.
///
/// A script is one string holding several statements separated by a line
/// that contains only the delimiter `SPLIT`. There is no SQL tokenizer: a
/// statement must never contain such a line itself.

use crate::core::db::connection::{Database, ResultSet, Session};
use crate::core::{Result, SqleaseError};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error};

/// Token that separates statements when it stands alone on a line
pub const SPLIT_DELIMITER: &str = "SPLIT";

static DELIMITER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?m)^[ \t]*{}[ \t]*\r?$", SPLIT_DELIMITER))
        .expect("delimiter pattern is valid")
});

/// Splits a script into its statements, in source order.
///
/// Fragments are trimmed and blank fragments dropped, so a script without
/// any delimiter line yields exactly one statement.
pub fn split_statements(script: &str) -> Vec<&str> {
    DELIMITER_LINE
        .split(script)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Runs each statement of `script` on `session`, stopping at the first failure.
///
/// Returns the number of statements executed.
pub fn run_script<S: Session + ?Sized>(session: &mut S, script: &str) -> Result<usize> {
    let statements = split_statements(script);
    for (index, statement) in statements.iter().enumerate() {
        let affected = session
            .execute(statement)
            .map_err(|source| SqleaseError::Statement {
                index,
                statement: statement.to_string(),
                source,
            })?;
        debug!("Statement {} affected {} rows", index, affected);
    }
    Ok(statements.len())
}

/// Statement primitives available on every `Database`.
///
/// Each call opens its own connection and drops it before returning, on
/// success and failure alike.
pub trait StatementRunner: Database {
    /// Runs a split script, treating any failure as fatal.
    ///
    /// # Panics
    ///
    /// Panics with the statement error if any statement fails. Statements
    /// after the failing one are not executed. Use `write_update` to handle
    /// the error instead.
    fn exec_update(&self, script: &str) -> bool {
        match self.write_update(script) {
            Ok(done) => done,
            Err(e) => {
                error!("Update failed: {}", e);
                panic!("update failed: {e}");
            }
        }
    }

    /// Runs a split script and returns the first failure to the caller.
    ///
    /// Each fragment between `SPLIT` lines must hold exactly one statement;
    /// a fragment with a second statement after a `;` fails as a whole.
    ///
    /// # Errors
    ///
    /// `SqleaseError::Connectivity` if no connection could be opened, or
    /// `SqleaseError::Statement` for the first failing statement.
    fn write_update(&self, script: &str) -> Result<bool> {
        let mut session = self.connect()?;
        let count = run_script(&mut session, script)?;
        debug!("Executed {} statements", count);
        Ok(true)
    }

    /// Runs one query and hands its rows to the caller.
    fn get_result_set(&self, query: &str) -> Result<ResultSet> {
        let mut session = self.connect()?;
        session
            .query(query)
            .map_err(|source| SqleaseError::Statement {
                index: 0,
                statement: query.to_string(),
                source,
            })
    }

    /// First column of the first row, or an empty string when there are no
    /// rows. A NULL value also reads as an empty string.
    fn read_data(&self, query: &str) -> Result<String> {
        Ok(self.read_optional(query)?.unwrap_or_default())
    }

    /// Like `read_data`, but `None` when the query returned no rows.
    fn read_optional(&self, query: &str) -> Result<Option<String>> {
        let rs = self.get_result_set(query)?;
        Ok(rs
            .first_value()
            .map(|value| value.unwrap_or_default().to_string()))
    }
}

impl<D: Database + ?Sized> StatementRunner for D {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DriverError;
    use crate::test_utils::{StoreFixture, TWO_TABLE_SCHEMA};
    use std::cell::RefCell;

    /// Session that records statements and fails on a chosen one.
    #[derive(Default)]
    struct RecordingSession {
        executed: Vec<String>,
        fail_on: Option<usize>,
    }

    impl Session for RecordingSession {
        fn execute(&mut self, sql: &str) -> std::result::Result<u64, DriverError> {
            if self.fail_on == Some(self.executed.len()) {
                return Err("boom".into());
            }
            self.executed.push(sql.to_string());
            Ok(1)
        }

        fn query(&mut self, _sql: &str) -> std::result::Result<ResultSet, DriverError> {
            Ok(ResultSet::default())
        }
    }

    /// Database counting how many connections were opened and closed.
    #[derive(Default)]
    struct CountingDatabase {
        opened: RefCell<usize>,
        closed: std::rc::Rc<RefCell<usize>>,
        fail_on: Option<usize>,
    }

    struct CountedSession {
        inner: RecordingSession,
        closed: std::rc::Rc<RefCell<usize>>,
    }

    impl Drop for CountedSession {
        fn drop(&mut self) {
            *self.closed.borrow_mut() += 1;
        }
    }

    impl Session for CountedSession {
        fn execute(&mut self, sql: &str) -> std::result::Result<u64, DriverError> {
            self.inner.execute(sql)
        }

        fn query(&mut self, sql: &str) -> std::result::Result<ResultSet, DriverError> {
            self.inner.query(sql)
        }
    }

    impl Database for CountingDatabase {
        type Session = CountedSession;

        fn connect(&self) -> Result<CountedSession> {
            *self.opened.borrow_mut() += 1;
            Ok(CountedSession {
                inner: RecordingSession {
                    fail_on: self.fail_on,
                    ..Default::default()
                },
                closed: self.closed.clone(),
            })
        }
    }

    #[test]
    fn test_split_statements() {
        let script = "CREATE TABLE a (x)\nSPLIT\nCREATE TABLE b (y)\n  SPLIT\t\r\nCREATE TABLE c (z)";
        insta::assert_debug_snapshot!(split_statements(script), @r#"
        [
            "CREATE TABLE a (x)",
            "CREATE TABLE b (y)",
            "CREATE TABLE c (z)",
        ]
        "#);
    }

    #[test]
    fn test_split_without_delimiter_is_one_statement() {
        assert_eq!(split_statements("SELECT 1"), vec!["SELECT 1"]);
        assert!(split_statements("  \n ").is_empty());
    }

    #[test]
    fn test_split_ignores_inline_token() {
        let script = "INSERT INTO t (x) VALUES ('SPLIT')";
        assert_eq!(split_statements(script), vec![script]);

        let script = "SELECT 1\nSPLITTING\nSELECT 2";
        assert_eq!(split_statements(script).len(), 1);
    }

    #[test]
    fn test_run_script_executes_in_order() {
        let mut session = RecordingSession::default();
        let count = run_script(&mut session, "one\nSPLIT\ntwo\nSPLIT\nthree").unwrap();
        assert_eq!(count, 3);
        assert_eq!(session.executed, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_run_script_stops_at_first_failure() {
        let mut session = RecordingSession {
            fail_on: Some(1),
            ..Default::default()
        };
        let err = run_script(&mut session, "one\nSPLIT\ntwo\nSPLIT\nthree").unwrap_err();

        match err {
            SqleaseError::Statement { index, statement, .. } => {
                assert_eq!(index, 1);
                assert_eq!(statement, "two");
            }
            other => panic!("Expected statement error, got {other:?}"),
        }
        assert_eq!(session.executed, vec!["one"]);
    }

    #[test]
    fn test_write_update_releases_connection_on_every_path() {
        let ok = CountingDatabase::default();
        assert!(ok.write_update("a\nSPLIT\nb").unwrap());
        assert_eq!(*ok.opened.borrow(), 1);
        assert_eq!(*ok.closed.borrow(), 1);

        let failing = CountingDatabase {
            fail_on: Some(0),
            ..Default::default()
        };
        assert!(failing.write_update("a").is_err());
        assert_eq!(*failing.opened.borrow(), 1);
        assert_eq!(*failing.closed.borrow(), 1);
    }

    #[test]
    fn test_exec_update_panics_and_releases() {
        let failing = CountingDatabase {
            fail_on: Some(0),
            ..Default::default()
        };
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            failing.exec_update("a")
        }));
        assert!(result.is_err());
        assert_eq!(*failing.closed.borrow(), 1);
    }

    #[test]
    fn test_round_trip_through_sqlite() {
        let fixture = StoreFixture::new();
        let db = fixture.builder().schema_script(TWO_TABLE_SCHEMA).build().unwrap();

        assert!(db.exec_update("INSERT INTO users (name) VALUES ('v')"));
        assert_eq!(db.read_data("SELECT name FROM users").unwrap(), "v");
    }

    #[test]
    fn test_empty_result_reads_as_empty_string() {
        let fixture = StoreFixture::new();
        let db = fixture.builder().schema_script(TWO_TABLE_SCHEMA).build().unwrap();

        assert_eq!(db.read_data("SELECT name FROM users").unwrap(), "");
        assert_eq!(db.read_optional("SELECT name FROM users").unwrap(), None);

        db.write_update("INSERT INTO users (name) VALUES ('')").unwrap();
        assert_eq!(db.read_data("SELECT name FROM users").unwrap(), "");
        assert_eq!(
            db.read_optional("SELECT name FROM users").unwrap(),
            Some(String::new())
        );
    }

    #[test]
    fn test_write_update_returns_statement_error() {
        let fixture = StoreFixture::new();
        let db = fixture.builder().schema_script(TWO_TABLE_SCHEMA).build().unwrap();

        let script = "INSERT INTO users (name) VALUES ('a')\nSPLIT\nINSERT INTO nowhere VALUES (1)\nSPLIT\nINSERT INTO users (name) VALUES ('c')";
        let err = db.write_update(script).unwrap_err();
        assert!(matches!(err, SqleaseError::Statement { index: 1, .. }));

        // The first statement stays applied, the third never ran.
        assert_eq!(db.read_data("SELECT COUNT(*) FROM users").unwrap(), "1");
    }

    #[test]
    fn test_semicolon_joined_fragment_is_rejected() {
        let fixture = StoreFixture::new();
        let db = fixture.builder().schema_script(TWO_TABLE_SCHEMA).build().unwrap();

        let script = "INSERT INTO users (name) VALUES ('a'); INSERT INTO users (name) VALUES ('b')";
        let err = db.write_update(script).unwrap_err();
        assert!(matches!(err, SqleaseError::Statement { index: 0, .. }));
        assert_eq!(db.read_data("SELECT COUNT(*) FROM users").unwrap(), "0");
    }

    #[test]
    fn test_get_result_set_cursor() {
        let fixture = StoreFixture::new();
        let db = fixture.builder().schema_script(TWO_TABLE_SCHEMA).build().unwrap();
        db.write_update("INSERT INTO users (name) VALUES ('a')\nSPLIT\nINSERT INTO users (name) VALUES ('b')")
            .unwrap();

        let mut rs = db.get_result_set("SELECT name FROM users ORDER BY name").unwrap();
        let mut names = Vec::new();
        while rs.advance() {
            names.push(rs.get_string(0).unwrap_or_default().to_string());
        }
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_query_is_a_statement_error() {
        let fixture = StoreFixture::new();
        let db = fixture.builder().build().unwrap();
        assert!(matches!(
            db.read_data("SELECT * FROM missing"),
            Err(SqleaseError::Statement { .. })
        ));
    }
}
