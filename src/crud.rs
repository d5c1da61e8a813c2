//! CRUD operations over arbitrary tables.
//!
//! Each operation is a self-contained request: the statement is built (and
//! validated) first, then a connection is leased from the provider, the
//! statement runs, rows are materialized if any, and the lease is released on
//! every exit path.
//!
//! Every operation returns a `Result`: argument problems surface as
//! `CrudError::InvalidArgument` without touching the database, and driver
//! faults (including an unavailable connection) as `CrudError::Persistence`.
//! Mutating operations return the affected-row count.

use crate::core::db::connection::{ConnectionProvider, Lease};
use crate::core::db::statement::{
    build_call, build_delete, build_insert, build_join, build_select, build_update, JoinKind,
    ProcedureParams, Statement,
};
use crate::core::{CrudError, DriverError, Result, ResultSet, Value};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Reserved key under which a procedure's result set appears in `ProcedureOutput::to_json`.
pub const RESULT_SET_KEY: &str = "resultSet";

/// What a stored-procedure call returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcedureOutput {
    /// Rows produced by the call, if it produced a result set.
    pub result_set: Option<ResultSet>,
    /// Every input parameter, holding its resolved output value.
    pub values: BTreeMap<String, Value>,
}

impl ProcedureOutput {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Merges the result set (under `RESULT_SET_KEY`) and the parameter values
    /// into one JSON object. A parameter named like the reserved key wins.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Serialize for ProcedureOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = self.values.len() + usize::from(self.result_set.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(rows) = &self.result_set {
            map.serialize_entry(RESULT_SET_KEY, rows)?;
        }
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Logs a rejected call before handing the error back.
fn rejected(err: CrudError) -> CrudError {
    error!("{}", err);
    err
}

/// Statement builder and executor bound to one connection provider.
pub struct CrudOperations<P> {
    provider: P,
}

impl<P: ConnectionProvider> CrudOperations<P> {
    pub fn new(provider: P) -> Self {
        CrudOperations { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn lease(&self, context: &str) -> Result<Lease<'_>> {
        Lease::acquire(&self.provider).ok_or_else(|| {
            error!("{}: no database connection available", context);
            CrudError::persistence(context, DriverError::Unavailable)
        })
    }

    fn run_execute(&self, statement: &Statement, context: &str) -> Result<usize> {
        debug!("{}", statement);
        let mut lease = self.lease(context)?;
        lease.execute(&statement.sql, &statement.params).map_err(|e| {
            error!("{}: {}", context, e);
            CrudError::persistence(context, e)
        })
    }

    fn run_query(&self, statement: &Statement, context: &str) -> Result<ResultSet> {
        debug!("{}", statement);
        let mut lease = self.lease(context)?;
        lease.query(&statement.sql, &statement.params).map_err(|e| {
            error!("{}: {}", context, e);
            CrudError::persistence(context, e)
        })
    }

    /// Inserts one record, binding `values` to `columns` by position.
    pub fn create(&self, table: &str, columns: &[&str], values: &[Value]) -> Result<usize> {
        let statement = build_insert(table, columns, values).map_err(rejected)?;
        let rows_affected = self.run_execute(&statement, "Failed to create record")?;
        info!("Successfully created record in table {}. Rows affected: {}", table, rows_affected);
        Ok(rows_affected)
    }

    /// Selects `columns` (every column when empty) from `table`.
    ///
    /// Rows are keyed by the column names the database reports, not by the
    /// names passed in.
    pub fn read(
        &self,
        table: &str,
        columns: &[&str],
        where_clause: Option<&str>,
    ) -> Result<ResultSet> {
        let statement = build_select(table, columns, where_clause);
        let rows = self.run_query(&statement, "Failed to read records")?;
        info!("Successfully read {} records from table {}", rows.len(), table);
        Ok(rows)
    }

    /// Sets `columns` to `values` on every row matching `where_clause`
    /// (every row when absent).
    pub fn update(
        &self,
        table: &str,
        columns: &[&str],
        values: &[Value],
        where_clause: Option<&str>,
    ) -> Result<usize> {
        let statement = build_update(table, columns, values, where_clause).map_err(rejected)?;
        let rows_affected = self.run_execute(&statement, "Failed to update record")?;
        info!("Record updated successfully in table {}. Rows affected: {}", table, rows_affected);
        Ok(rows_affected)
    }

    /// Deletes the rows matching `where_clause`, which must not be blank.
    pub fn delete(&self, table: &str, where_clause: &str) -> Result<usize> {
        let statement = build_delete(table, where_clause).map_err(rejected)?;
        let rows_affected = self.run_execute(&statement, "Failed to delete records")?;
        info!("Successfully deleted {} records from table {}", rows_affected, table);
        Ok(rows_affected)
    }

    /// Inner-joins `tables` in order; `conditions[i]` joins `tables[i + 1]`.
    pub fn join(
        &self,
        tables: &[&str],
        conditions: &[&str],
        columns: &[&str],
        where_clause: Option<&str>,
    ) -> Result<ResultSet> {
        self.join_with(JoinKind::Inner, tables, conditions, columns, where_clause)
    }

    /// Like `join`, with an explicit join keyword.
    pub fn join_with(
        &self,
        kind: JoinKind,
        tables: &[&str],
        conditions: &[&str],
        columns: &[&str],
        where_clause: Option<&str>,
    ) -> Result<ResultSet> {
        let statement =
            build_join(kind, tables, conditions, columns, where_clause).map_err(rejected)?;
        let rows = self.run_query(&statement, "Failed to execute join query")?;
        info!("Successfully executed join query. Records returned: {}", rows.len());
        Ok(rows)
    }

    /// Calls a stored procedure, binding `params` positionally in name order.
    ///
    /// The output holds every input parameter name, overwritten with the
    /// value the driver resolved for it, plus the result set if the call
    /// produced one.
    pub fn call_procedure(&self, name: &str, params: &ProcedureParams) -> Result<ProcedureOutput> {
        let statement = build_call(name, params).map_err(rejected)?;
        let names: Vec<String> = params.keys().cloned().collect();
        let context = format!("Failed to execute stored procedure {}", name.trim());

        debug!("{}", statement);
        let mut lease = self.lease(&context)?;
        let outcome = lease
            .call(&statement.sql, &statement.params, &names)
            .map_err(|e| {
                error!("{}: {}", context, e);
                CrudError::persistence(&context, e)
            })?;

        let mut values = params.clone();
        for (param, value) in values.iter_mut() {
            if let Some(resolved) = outcome.outputs.get(param) {
                *value = resolved.clone();
            }
        }

        info!("Successfully executed stored procedure: {}", name.trim());
        Ok(ProcedureOutput {
            result_set: outcome.result_set,
            values,
        })
    }
}
