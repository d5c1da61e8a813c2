/// # Test Utilities Module
///
/// Testing infrastructure shared by the unit tests:
/// - `RecordingProvider`, an in-memory driver that records every statement,
///   binding, acquisition and release, with fault injection
/// - `DatabaseFixture`, an isolated file-backed SQLite database with a
///   standard schema

use crate::config::DatabaseConfig;
use crate::core::db::connection::{CallOutcome, Connection, ConnectionProvider};
use crate::core::db::procedure::ProcedureCatalog;
use crate::core::db::sqlite::{SqliteConnection, SqliteProvider};
use crate::core::{CrudError, DriverError, DriverResult, Result, ResultSet, Value};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tempfile::TempDir;

/// Which `Connection` method received a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Execute,
    Query,
    Call,
}

/// One statement as the driver saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<Value>,
}

/// Everything the recording driver observed.
#[derive(Debug, Clone, Default)]
pub struct DriverLog {
    pub acquired: usize,
    pub released: usize,
    pub statements: Vec<RecordedStatement>,
}

#[derive(Debug, Clone, Default)]
struct Script {
    fault: Option<String>,
    rows: ResultSet,
    affected: usize,
    outcome: CallOutcome,
}

/// Provider whose connections record instead of executing.
#[derive(Debug, Clone)]
pub struct RecordingProvider {
    log: Rc<RefCell<DriverLog>>,
    script: Script,
    available: bool,
}

impl RecordingProvider {
    pub fn new() -> Self {
        RecordingProvider {
            log: Rc::new(RefCell::new(DriverLog::default())),
            script: Script::default(),
            available: true,
        }
    }

    /// Every statement fails with `message`.
    pub fn failing(message: &str) -> Self {
        let mut provider = Self::new();
        provider.script.fault = Some(message.to_string());
        provider
    }

    /// `acquire` always comes back empty.
    pub fn unavailable() -> Self {
        let mut provider = Self::new();
        provider.available = false;
        provider
    }

    pub fn with_rows(mut self, rows: ResultSet) -> Self {
        self.script.rows = rows;
        self
    }

    pub fn with_affected(mut self, affected: usize) -> Self {
        self.script.affected = affected;
        self
    }

    pub fn with_call_outcome(mut self, outcome: CallOutcome) -> Self {
        self.script.outcome = outcome;
        self
    }

    /// Snapshot of everything recorded so far.
    pub fn log(&self) -> DriverLog {
        self.log.borrow().clone()
    }
}

impl ConnectionProvider for RecordingProvider {
    fn acquire(&self) -> Option<Box<dyn Connection>> {
        if !self.available {
            return None;
        }
        self.log.borrow_mut().acquired += 1;
        Some(Box::new(RecordingConnection {
            log: Rc::clone(&self.log),
            script: self.script.clone(),
        }))
    }
}

struct RecordingConnection {
    log: Rc<RefCell<DriverLog>>,
    script: Script,
}

impl RecordingConnection {
    fn record(&self, kind: StatementKind, sql: &str, params: &[Value]) -> DriverResult<()> {
        self.log.borrow_mut().statements.push(RecordedStatement {
            kind,
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        match &self.script.fault {
            Some(message) => Err(DriverError::Other(message.clone())),
            None => Ok(()),
        }
    }
}

impl Connection for RecordingConnection {
    fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<usize> {
        self.record(StatementKind::Execute, sql, params)?;
        Ok(self.script.affected)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> DriverResult<ResultSet> {
        self.record(StatementKind::Query, sql, params)?;
        Ok(self.script.rows.clone())
    }

    fn call(
        &mut self,
        sql: &str,
        params: &[Value],
        _names: &[String],
    ) -> DriverResult<CallOutcome> {
        self.record(StatementKind::Call, sql, params)?;
        Ok(self.script.outcome.clone())
    }

    fn close(self: Box<Self>) -> DriverResult<()> {
        self.log.borrow_mut().released += 1;
        Ok(())
    }
}

/// Isolated file-backed database; removed when the fixture drops.
pub struct DatabaseFixture {
    _dir: TempDir,
    pub path: String,
}

impl DatabaseFixture {
    /// Create a new, empty test database
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let path = dir.path().join("fixture.db").to_string_lossy().into_owned();
        rusqlite::Connection::open(&path).map_err(|e| {
            CrudError::persistence("Failed to create fixture database", DriverError::Database(e))
        })?;
        Ok(DatabaseFixture { _dir: dir, path })
    }

    /// Create fixture with sample data schema
    pub fn with_sample_data() -> Result<Self> {
        let fixture = Self::new()?;
        let conn = fixture.open()?;
        conn.raw()
            .execute_batch(
                "
                CREATE TABLE users (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT UNIQUE,
                    active BOOLEAN NOT NULL DEFAULT 1,
                    created_at DATETIME
                );

                CREATE TABLE posts (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL REFERENCES users (id),
                    title TEXT NOT NULL,
                    published BOOLEAN NOT NULL DEFAULT 0
                );

                INSERT INTO users (id, name, email, created_at) VALUES
                    (1, 'alice', 'alice@example.com', '2024-01-15 09:30:00'),
                    (2, 'bob', 'bob@example.com', '2024-02-01 14:00:00'),
                    (3, 'charlie', 'charlie@example.com', NULL);

                INSERT INTO posts (user_id, title, published) VALUES
                    (1, 'Welcome to Rust', 1),
                    (2, 'My Trip to Paris', 0),
                    (1, 'Building Terminal UIs', 1);
                ",
            )
            .map_err(|e| {
                CrudError::persistence("Failed to seed fixture", DriverError::Database(e))
            })?;
        Ok(fixture)
    }

    pub fn open(&self) -> Result<SqliteConnection> {
        self.open_with(ProcedureCatalog::new())
    }

    pub fn open_with(&self, procedures: ProcedureCatalog) -> Result<SqliteConnection> {
        SqliteConnection::open(&self.path, Arc::new(procedures))
            .map_err(|e| CrudError::persistence("Failed to open fixture", e))
    }

    pub fn config(&self) -> DatabaseConfig {
        DatabaseConfig::new(format!("sqlite://{}", self.path), "test", "test")
    }

    pub fn provider(&self) -> SqliteProvider {
        SqliteProvider::new(self.config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_data_fixture() {
        let fixture = DatabaseFixture::with_sample_data().unwrap();
        let count: i64 = fixture
            .open()
            .unwrap()
            .raw()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .expect("Failed to count users");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_recording_provider_counts_lifecycle() {
        let provider = RecordingProvider::new().with_affected(2);
        let conn = provider.acquire();
        provider.release(conn);

        let log = provider.log();
        assert_eq!(log.acquired, 1);
        assert_eq!(log.released, 1);
        assert!(log.statements.is_empty());
    }
}
