/// Core Module
///
/// Shared infrastructure for the CRUD layer: error types, the dynamic value
/// model used for bindings and rows, and the database seam (connections,
/// providers, statement assembly and the SQLite driver).

pub mod db;
pub mod error;
pub mod value;

// Re-export commonly used types for convenience
pub use error::{CrudError, DriverError, DriverResult, Result};
pub use value::{ResultSet, Row, Value};
