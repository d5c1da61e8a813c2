/// Connection Management Module
///
/// This module defines the seam between the CRUD executor and a concrete
/// database driver:
/// - `Connection` executes already-assembled SQL with positional bindings.
/// - `ConnectionProvider` hands out one connection per operation and closes it.
/// - `Lease` scopes a connection so it is released on every exit path.

use crate::core::{DriverResult, ResultSet, Value};
use std::collections::HashMap;
use std::mem::ManuallyDrop;
use tracing::{error, info};

/// What a procedure call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOutcome {
    /// Rows produced by the call, if it produced a result set at all
    pub result_set: Option<ResultSet>,
    /// Resolved output parameter values, by parameter name
    pub outputs: HashMap<String, Value>,
}

/// A live, exclusively owned database connection.
pub trait Connection {
    /// Executes a statement that produces no rows and returns the affected-row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<usize>;

    /// Executes a query and materializes every row using the result metadata.
    fn query(&mut self, sql: &str, params: &[Value]) -> DriverResult<ResultSet>;

    /// Executes a callable-statement invocation.
    ///
    /// `params` are bound positionally; `names` lists the parameter names in
    /// the same order so that output values can be resolved by name.
    fn call(
        &mut self,
        sql: &str,
        params: &[Value],
        names: &[String],
    ) -> DriverResult<CallOutcome>;

    /// Closes the connection.
    fn close(self: Box<Self>) -> DriverResult<()>;
}

/// Opens and closes connections.
///
/// `acquire` never raises: failures are logged and surface as `None`.
pub trait ConnectionProvider {
    fn acquire(&self) -> Option<Box<dyn Connection>>;

    /// Closes an active connection. A `None` connection is a no-op; close
    /// failures are logged and swallowed.
    fn release(&self, conn: Option<Box<dyn Connection>>) {
        if let Some(conn) = conn {
            match conn.close() {
                Ok(()) => info!("Database connection closed"),
                Err(e) => error!("Error closing database connection: {}", e),
            }
        }
    }
}

/// A connection borrowed from a provider for the duration of one operation.
///
/// Dropping the lease hands the connection back to `ConnectionProvider::release`.
pub struct Lease<'p> {
    provider: &'p dyn ConnectionProvider,
    // Moved out exactly once, in `drop`.
    conn: ManuallyDrop<Box<dyn Connection>>,
}

impl<'p> Lease<'p> {
    /// Acquires a connection, or `None` when the provider has none to give.
    pub fn acquire(provider: &'p dyn ConnectionProvider) -> Option<Self> {
        let conn = provider.acquire()?;
        Some(Lease {
            provider,
            conn: ManuallyDrop::new(conn),
        })
    }

    pub fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<usize> {
        self.conn.execute(sql, params)
    }

    pub fn query(&mut self, sql: &str, params: &[Value]) -> DriverResult<ResultSet> {
        self.conn.query(sql, params)
    }

    pub fn call(
        &mut self,
        sql: &str,
        params: &[Value],
        names: &[String],
    ) -> DriverResult<CallOutcome> {
        self.conn.call(sql, params, names)
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        // SAFETY: `conn` is never read again after this point.
        let conn = unsafe { ManuallyDrop::take(&mut self.conn) };
        self.provider.release(Some(conn));
    }
}
