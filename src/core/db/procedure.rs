//! Procedure catalog for drivers without native stored procedures.
//!
//! A procedure is a single SQL statement with positional `?` parameters,
//! registered under a name and invoked through the `{call name(?, ...)}`
//! escape produced by `build_call`.

use crate::core::{DriverError, DriverResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static CALL_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\{\s*call\s+([A-Za-z_][\w.]*)\s*\(([^)]*)\)\s*\}\s*$")
        .expect("call escape pattern is valid")
});

/// A parsed `{call name(...)}` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEscape {
    pub name: String,
    pub placeholders: usize,
}

/// Parses a callable-statement escape into the procedure name and its
/// placeholder count.
pub fn parse_call_escape(sql: &str) -> DriverResult<CallEscape> {
    let caps = CALL_ESCAPE
        .captures(sql)
        .ok_or_else(|| DriverError::Procedure(format!("Not a procedure call: {}", sql)))?;

    let args = caps[2].trim();
    let placeholders = if args.is_empty() {
        0
    } else {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.iter().any(|p| *p != "?") {
            return Err(DriverError::Procedure(format!(
                "Procedure arguments must be positional placeholders: {}",
                sql
            )));
        }
        parts.len()
    };

    Ok(CallEscape {
        name: caps[1].to_string(),
        placeholders,
    })
}

/// Named procedure bodies.
#[derive(Debug, Clone, Default)]
pub struct ProcedureCatalog {
    procedures: HashMap<String, String>,
}

impl ProcedureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_procedure(mut self, name: &str, body: &str) -> Self {
        self.register(name, body);
        self
    }

    pub fn register(&mut self, name: &str, body: &str) {
        self.procedures.insert(name.to_string(), body.to_string());
    }

    /// Looks up a procedure body by name.
    pub fn body(&self, name: &str) -> DriverResult<&str> {
        self.procedures
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| DriverError::UnknownProcedure(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

impl From<HashMap<String, String>> for ProcedureCatalog {
    fn from(procedures: HashMap<String, String>) -> Self {
        ProcedureCatalog { procedures }
    }
}
