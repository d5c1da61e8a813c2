/// Statement Assembly Module
///
/// Builds SQL text and positional bindings for every CRUD operation. All
/// argument validation happens here, so a rejected call never reaches a
/// connection.
///
/// ## Trust boundary
///
/// Table names, column names, join conditions and WHERE fragments are
/// concatenated into the SQL text verbatim. Only values are bound as
/// parameters. Callers must never pass untrusted input in identifier or
/// clause positions; escape or allow-list identifiers upstream if that cannot
/// be guaranteed.

use crate::core::{CrudError, Result, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Procedure parameters by name. Binding order is ascending name order.
pub type ProcedureParams = BTreeMap<String, Value>;

/// SQL text plus the values bound to its positional placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Statement { sql, params }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Join keyword used between consecutive tables of a join query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn column_list(columns: &[&str]) -> String {
    if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    }
}

/// Returns the clause if it has any non-whitespace content.
fn present(clause: Option<&str>) -> Option<&str> {
    clause.filter(|c| !c.trim().is_empty())
}

fn push_where(sql: &mut String, where_clause: Option<&str>) {
    if let Some(clause) = present(where_clause) {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
}

/// `INSERT INTO <table> (<cols>) VALUES (?, ...)`, one placeholder per column.
pub fn build_insert(table: &str, columns: &[&str], values: &[Value]) -> Result<Statement> {
    if columns.is_empty() || columns.len() != values.len() {
        return Err(CrudError::invalid_argument(
            "Columns and values must be non-empty and of equal length",
        ));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders(columns.len())
    );
    Ok(Statement::new(sql, values.to_vec()))
}

/// `SELECT <cols|*> FROM <table> [WHERE <clause>]`.
///
/// An empty column list selects every column; a blank clause is omitted.
pub fn build_select(table: &str, columns: &[&str], where_clause: Option<&str>) -> Statement {
    let mut sql = format!("SELECT {} FROM {}", column_list(columns), table);
    push_where(&mut sql, where_clause);
    Statement::new(sql, Vec::new())
}

/// `UPDATE <table> SET c1 = ?, c2 = ? [WHERE <clause>]`.
pub fn build_update(
    table: &str,
    columns: &[&str],
    values: &[Value],
    where_clause: Option<&str>,
) -> Result<Statement> {
    if columns.is_empty() {
        return Err(CrudError::invalid_argument("Columns cannot be empty"));
    }
    if columns.len() != values.len() {
        return Err(CrudError::invalid_argument(format!(
            "Columns and values must be of equal length: {} columns, {} values",
            columns.len(),
            values.len()
        )));
    }

    let assignments: Vec<String> = columns.iter().map(|c| format!("{} = ?", c)).collect();
    let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
    push_where(&mut sql, where_clause);
    Ok(Statement::new(sql, values.to_vec()))
}

/// `DELETE FROM <table> WHERE <clause>`; the clause is mandatory.
pub fn build_delete(table: &str, where_clause: &str) -> Result<Statement> {
    if where_clause.trim().is_empty() {
        return Err(CrudError::invalid_argument(
            "Where clause cannot be empty for delete operation",
        ));
    }
    Ok(Statement::new(
        format!("DELETE FROM {} WHERE {}", table, where_clause),
        Vec::new(),
    ))
}

/// `SELECT <cols|*> FROM t0 <JOIN> t1 ON c0 <JOIN> t2 ON c1 ... [WHERE <clause>]`.
///
/// `conditions[i]` is the ON condition for `tables[i + 1]`, so exactly
/// `tables.len() - 1` conditions are required.
pub fn build_join(
    kind: JoinKind,
    tables: &[&str],
    conditions: &[&str],
    columns: &[&str],
    where_clause: Option<&str>,
) -> Result<Statement> {
    if tables.len() < 2 {
        return Err(CrudError::invalid_argument(
            "At least two tables are required for a join",
        ));
    }
    if conditions.is_empty() {
        return Err(CrudError::invalid_argument(
            "At least one join condition is required",
        ));
    }
    if conditions.len() != tables.len() - 1 {
        return Err(CrudError::invalid_argument(format!(
            "Joining {} tables requires {} join conditions, got {}",
            tables.len(),
            tables.len() - 1,
            conditions.len()
        )));
    }

    let mut sql = format!("SELECT {} FROM {}", column_list(columns), tables[0]);
    for (table, condition) in tables[1..].iter().zip(conditions) {
        sql.push_str(&format!(" {} {} ON {}", kind.keyword(), table, condition));
    }
    push_where(&mut sql, where_clause);
    Ok(Statement::new(sql, Vec::new()))
}

/// `{call <name>(?, ...)}` with one placeholder per parameter, in name order.
pub fn build_call(name: &str, params: &ProcedureParams) -> Result<Statement> {
    if name.trim().is_empty() {
        return Err(CrudError::invalid_argument(
            "Procedure name cannot be empty",
        ));
    }

    let sql = format!("{{call {}({})}}", name.trim(), placeholders(params.len()));
    Ok(Statement::new(sql, params.values().cloned().collect()))
}
