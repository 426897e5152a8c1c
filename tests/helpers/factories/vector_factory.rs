use crate::engine::core::vector::{LogicalType, Value, ValueVector};

/// Builds value vectors for tests.
pub struct VectorFactory;

impl VectorFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn bigints(&self, values: &[i64]) -> ValueVector {
        ValueVector::from_values(
            LogicalType::BigInt,
            values.iter().map(|v| Value::BigInt(*v)).collect(),
        )
    }

    pub fn bigints_opt(&self, values: &[Option<i64>]) -> ValueVector {
        ValueVector::from_values(
            LogicalType::BigInt,
            values
                .iter()
                .map(|v| v.map(Value::BigInt).unwrap_or(Value::Null))
                .collect(),
        )
    }

    /// `count` sequential bigints starting at `from`.
    pub fn bigint_range(&self, from: i64, count: usize) -> ValueVector {
        ValueVector::from_values(
            LogicalType::BigInt,
            (0..count as i64).map(|i| Value::BigInt(from + i)).collect(),
        )
    }

    pub fn varchars(&self, values: &[&str]) -> ValueVector {
        ValueVector::from_values(
            LogicalType::Varchar,
            values.iter().map(|v| Value::Varchar(v.to_string())).collect(),
        )
    }
}
