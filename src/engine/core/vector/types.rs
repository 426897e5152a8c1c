use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub type RowId = u64;

/// Sentinel row id marking an append-only streaming column. Segments created
/// at this start row are sized by the streaming capacity policy instead of
/// the storage block size.
pub const MAX_ROW_ID: RowId = u64::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalType {
    Boolean,
    Integer,
    BigInt,
    Double,
    Varchar,
    /// Bitmask-only column paired with a value column.
    Validity,
    List(Box<LogicalType>),
    Struct(Vec<(String, LogicalType)>),
    Array(Box<LogicalType>, usize),
}

impl LogicalType {
    /// Bytes of storage accounted per row when sizing a segment.
    /// Variable-length values are accounted at pointer width, like the
    /// in-memory string representation they decode into.
    pub fn fixed_size(&self) -> usize {
        match self {
            LogicalType::Boolean | LogicalType::Validity => 1,
            LogicalType::Integer => 4,
            LogicalType::BigInt | LogicalType::Double => 8,
            LogicalType::Varchar => 16,
            LogicalType::List(_) | LogicalType::Struct(_) | LogicalType::Array(..) => {
                debug_assert!(false, "nested types have no per-row storage size");
                0
            }
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(
            self,
            LogicalType::List(_) | LogicalType::Struct(_) | LogicalType::Array(..)
        )
    }

    pub fn name(&self) -> String {
        match self {
            LogicalType::Boolean => "BOOLEAN".to_string(),
            LogicalType::Integer => "INTEGER".to_string(),
            LogicalType::BigInt => "BIGINT".to_string(),
            LogicalType::Double => "DOUBLE".to_string(),
            LogicalType::Varchar => "VARCHAR".to_string(),
            LogicalType::Validity => "VALIDITY".to_string(),
            LogicalType::List(child) => format!("LIST({})", child.name()),
            LogicalType::Struct(fields) => {
                let inner: Vec<String> = fields
                    .iter()
                    .map(|(name, ty)| format!("{} {}", name, ty.name()))
                    .collect();
                format!("STRUCT({})", inner.join(", "))
            }
            LogicalType::Array(child, size) => format!("ARRAY({}, {})", child.name(), size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i32),
    BigInt(i64),
    Double(f64),
    Varchar(String),
    List(Vec<Value>),
    Struct(Vec<Value>),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Ordering between two values of the same variant; `None` when either
    /// side is null or the variants differ.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::BigInt(a), Value::BigInt(b)) => Some(a.cmp(b)),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Varchar(a), Value::Varchar(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}
