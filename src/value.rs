use std::fmt;

use serde::{Deserialize, Serialize};

/// Primitive type of a column. Every value of a column must carry this type
/// for the whole lifetime of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Utf8,
    F64,
    I64,
    Bool,
    /// Milliseconds since the Unix epoch.
    Timestamp,
}

impl ColumnType {
    /// Byte width of one element under plain encoding, `None` for
    /// variable-length types.
    pub(crate) fn fixed_width(self) -> Option<usize> {
        match self {
            ColumnType::F64 | ColumnType::I64 | ColumnType::Timestamp => Some(8),
            ColumnType::Bool => Some(1),
            ColumnType::Utf8 => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Utf8 => "utf8",
            ColumnType::F64 => "f64",
            ColumnType::I64 => "i64",
            ColumnType::Bool => "bool",
            ColumnType::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single cell. The variant must match the declared [`ColumnType`] of its
/// column; the writer rejects rows where it does not.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Utf8(String),
    F64(f64),
    I64(i64),
    Bool(bool),
    Timestamp(i64),
}

impl Value {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Utf8(_) => ColumnType::Utf8,
            Value::F64(_) => ColumnType::F64,
            Value::I64(_) => ColumnType::I64,
            Value::Bool(_) => ColumnType::Bool,
            Value::Timestamp(_) => ColumnType::Timestamp,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) | Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Utf8(s) => f.write_str(s),
            Value::F64(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}ms", v),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Utf8(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Utf8(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
