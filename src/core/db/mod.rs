/// Database Module
///
/// The database seam of the CRUD layer, organized into focused submodules:
///
/// - **Connection Management** (`connection.rs`): the `Connection` and
///   `ConnectionProvider` traits and the scoped `Lease`
/// - **Statement Assembly** (`statement.rs`): SQL text and positional bindings
///   for every operation, with argument validation
/// - **Procedures** (`procedure.rs`): the procedure catalog and call-escape parsing
/// - **SQLite Driver** (`sqlite.rs`): the rusqlite-backed provider
///
/// ## Error Handling
///
/// Drivers report `DriverError`; the executor wraps it into `CrudError::Persistence`.
pub mod connection;
pub mod procedure;
pub mod sqlite;
pub mod statement;

pub use connection::{CallOutcome, Connection, ConnectionProvider, Lease};
pub use procedure::ProcedureCatalog;
pub use sqlite::{SqliteConnection, SqliteProvider};
pub use statement::{JoinKind, ProcedureParams, Statement};
