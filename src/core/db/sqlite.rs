/// SQLite Driver Module
///
/// The rusqlite-backed `ConnectionProvider`. Every `acquire` opens a fresh
/// connection from the provider's `DatabaseConfig`; nothing is pooled or
/// shared between operations.

use crate::config::DatabaseConfig;
use crate::core::db::connection::{CallOutcome, Connection, ConnectionProvider};
use crate::core::db::procedure::{parse_call_escape, ProcedureCatalog};
use crate::core::{DriverError, DriverResult, ResultSet, Row, Value};
use rusqlite::params_from_iter;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Runs a prepared statement and maps every row by the column names the
/// statement reports.
fn materialize(
    stmt: &mut rusqlite::Statement<'_>,
    params: &[Value],
) -> rusqlite::Result<ResultSet> {
    let columns: Vec<(String, Option<String>)> = stmt
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), c.decl_type().map(str::to_string)))
        .collect();

    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut results = ResultSet::new();
    while let Some(row) = rows.next()? {
        let mut mapped = Row::with_capacity(columns.len());
        for (i, (name, decl_type)) in columns.iter().enumerate() {
            let value = Value::from_sql_ref(row.get_ref(i)?, decl_type.as_deref());
            mapped.insert(name.clone(), value);
        }
        results.push(mapped);
    }
    Ok(results)
}

/// A single open SQLite connection.
pub struct SqliteConnection {
    inner: rusqlite::Connection,
    procedures: Arc<ProcedureCatalog>,
}

impl SqliteConnection {
    /// Opens the database at `path` (`:memory:` for an in-memory database).
    pub fn open(path: &str, procedures: Arc<ProcedureCatalog>) -> DriverResult<Self> {
        let inner = rusqlite::Connection::open(path)?;
        inner.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(SqliteConnection { inner, procedures })
    }

    /// Access to the underlying rusqlite connection.
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.inner
    }
}

impl Connection for SqliteConnection {
    fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<usize> {
        debug!("Executing: {}", sql);
        let mut stmt = self.inner.prepare(sql)?;
        Ok(stmt.execute(params_from_iter(params.iter()))?)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> DriverResult<ResultSet> {
        debug!("Querying: {}", sql);
        let mut stmt = self.inner.prepare(sql)?;
        Ok(materialize(&mut stmt, params)?)
    }

    fn call(&mut self, sql: &str, params: &[Value], names: &[String]) -> DriverResult<CallOutcome> {
        let escape = parse_call_escape(sql)?;
        if escape.placeholders != params.len() {
            return Err(DriverError::Procedure(format!(
                "{} has {} placeholders but {} values were bound",
                escape.name,
                escape.placeholders,
                params.len()
            )));
        }

        let body = self.procedures.body(&escape.name)?;
        debug!("Calling {}: {}", escape.name, body);
        let mut stmt = self.inner.prepare(body)?;
        if stmt.parameter_count() != params.len() {
            return Err(DriverError::Procedure(format!(
                "{} expects {} parameters, got {}",
                escape.name,
                stmt.parameter_count(),
                params.len()
            )));
        }

        let result_set = if stmt.column_count() > 0 {
            Some(materialize(&mut stmt, params)?)
        } else {
            stmt.execute(params_from_iter(params.iter()))?;
            None
        };

        // No OUT parameters in SQLite: a same-named column of the first row
        // stands in for one, otherwise the input value is echoed back.
        let first_row = result_set.as_ref().and_then(|rows| rows.first());
        let outputs = names
            .iter()
            .zip(params)
            .map(|(name, input)| {
                let value = first_row
                    .and_then(|row| row.get(name))
                    .unwrap_or(input)
                    .clone();
                (name.clone(), value)
            })
            .collect();

        Ok(CallOutcome { result_set, outputs })
    }

    fn close(self: Box<Self>) -> DriverResult<()> {
        self.inner.close().map_err(|(_, e)| DriverError::Database(e))
    }
}

/// Opens SQLite connections from an explicit `DatabaseConfig`.
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    config: DatabaseConfig,
    procedures: Arc<ProcedureCatalog>,
}

impl SqliteProvider {
    pub fn new(config: DatabaseConfig) -> Self {
        SqliteProvider {
            config,
            procedures: Arc::new(ProcedureCatalog::new()),
        }
    }

    pub fn with_procedures(mut self, procedures: ProcedureCatalog) -> Self {
        self.procedures = Arc::new(procedures);
        self
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}

impl ConnectionProvider for SqliteProvider {
    fn acquire(&self) -> Option<Box<dyn Connection>> {
        if let Err(e) = self.config.validate() {
            error!("{}", e);
            return None;
        }

        match SqliteConnection::open(self.config.database_path(), Arc::clone(&self.procedures)) {
            Ok(conn) => {
                info!("Database connection established for user {}", self.config.user);
                Some(Box::new(conn))
            }
            Err(e) => {
                error!("Error establishing database connection: {}", e);
                None
            }
        }
    }
}
