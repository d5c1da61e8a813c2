/// Error Module
///
/// This module defines the error types surfaced by the CRUD layer. Callers
/// only ever see `CrudError`; driver implementations report failures through
/// `DriverError`, which is carried as the source of `CrudError::Persistence`.
use thiserror::Error;

/// Error type raised to callers of the CRUD operations.
///
/// - `InvalidArgument` is raised before any database interaction for a
///   malformed call shape and is never retryable as-is.
/// - `Persistence` wraps a driver-level fault, including the absence of a
///   usable connection.
/// - The remaining variants cover configuration loading and serialization.
#[derive(Error, Debug)]
pub enum CrudError {
    /// Malformed call shape (mismatched columns/values, blank clause, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Database-level fault wrapping the underlying driver error
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: DriverError,
    },

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrudError {
    /// Wraps a driver fault with the failing operation's context.
    ///
    /// The driver's message is folded into the outer message so that a
    /// caller printing only the top-level error still sees the cause.
    pub fn persistence(context: &str, source: DriverError) -> Self {
        CrudError::Persistence {
            message: format!("{}: {}", context, source),
            source,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CrudError::InvalidArgument(message.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CrudError::InvalidArgument(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, CrudError::Persistence { .. })
    }
}

/// Failures reported by a `Connection` implementation.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Errors from SQLite operations
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The provider could not hand out a connection
    #[error("No database connection available")]
    Unavailable,

    /// Procedure name not present in the catalog
    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    /// Malformed procedure invocation or body
    #[error("Procedure error: {0}")]
    Procedure(String),

    /// Faults from drivers that are not backed by rusqlite
    #[error("{0}")]
    Other(String),
}

/// Type alias for Result to use CrudError as the error type.
pub type Result<T> = std::result::Result<T, CrudError>;

/// Result type returned by `Connection` implementations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;
