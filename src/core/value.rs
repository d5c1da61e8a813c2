/// Value Module
///
/// The dynamically-typed scalar carried in bindings and result rows, and the
/// conversions between it and SQLite's storage classes.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Text format used when binding and decoding timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Text format used when binding and decoding calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of a result set, keyed by the column name reported by the
/// statement metadata.
pub type Row = HashMap<String, Value>;

/// Ordered rows sharing one column schema.
pub type ResultSet = Vec<Row>;

/// Scalar value bound to a placeholder or read back from a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Boolean(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Decodes a column value using the column's declared type, if any.
    ///
    /// SQLite only stores NULL, INTEGER, REAL, TEXT and BLOB. Booleans and
    /// temporals are recovered from the declared type: `BOOL*` columns map
    /// 0 and 1 to `Boolean`, `DATE*`/`*TIME*` columns map text to `Timestamp`
    /// or `Date`. Anything else is decoded by storage class.
    ///
    /// A typed value is only produced when binding it again writes back the
    /// exact stored text or integer, so a read followed by an update never
    /// rewrites a column.
    pub fn from_sql_ref(value: ValueRef<'_>, decl_type: Option<&str>) -> Self {
        let affinity = decl_type.map(str::to_ascii_uppercase);
        let affinity = affinity.as_deref().unwrap_or("");

        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i @ (0 | 1)) if affinity.starts_with("BOOL") => {
                Value::Boolean(i == 1)
            }
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => {
                let text = String::from_utf8_lossy(t).into_owned();
                if affinity.contains("DATE") || affinity.contains("TIME") {
                    if let Some(temporal) = parse_temporal(&text) {
                        return temporal;
                    }
                }
                Value::Text(text)
            }
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

/// Parses text that re-formats to itself under `TIMESTAMP_FORMAT` or
/// `DATE_FORMAT`.
fn parse_temporal(text: &str) -> Option<Value> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
        if ts.format(TIMESTAMP_FORMAT).to_string() == text {
            return Some(Value::Timestamp(ts));
        }
    }
    match NaiveDate::parse_from_str(text, DATE_FORMAT) {
        Ok(date) if date.format(DATE_FORMAT).to_string() == text => Some(Value::Date(date)),
        _ => None,
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Boolean(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Timestamp(ts) => {
                ToSqlOutput::Owned(SqlValue::Text(ts.format(TIMESTAMP_FORMAT).to_string()))
            }
            Value::Date(date) => {
                ToSqlOutput::Owned(SqlValue::Text(date.format(DATE_FORMAT).to_string()))
            }
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Timestamp(ts) => serializer.collect_str(&ts.format(TIMESTAMP_FORMAT)),
            Value::Date(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
            Value::Blob(b) => serializer.serialize_bytes(b),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
