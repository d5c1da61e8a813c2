//! Generic relational-database CRUD layer.
//!
//! `CrudOperations` builds SQL for create, read, update, delete, join and
//! stored-procedure calls over arbitrary tables, runs it on a connection
//! leased from a `ConnectionProvider`, and materializes result rows as
//! column-name-to-value maps. `SqliteProvider` is the bundled provider.
//!
//! Identifiers and WHERE fragments are inserted into the SQL verbatim; see
//! `core::db::statement` for the trust boundary.

// Core infrastructure modules
pub mod config;
pub mod core;
pub mod crud;
pub mod logging;

#[cfg(test)]
mod test_utils;

pub use crate::config::{load_config, Config, DatabaseConfig};
pub use crate::core::db::{
    CallOutcome, Connection, ConnectionProvider, JoinKind, ProcedureCatalog, ProcedureParams,
    SqliteProvider,
};
pub use crate::core::{CrudError, DriverError, Result, ResultSet, Row, Value};
pub use crate::crud::{CrudOperations, ProcedureOutput, RESULT_SET_KEY};
