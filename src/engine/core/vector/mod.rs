pub mod types;
pub mod validity;
pub mod value_vector;

pub use types::{LogicalType, MAX_ROW_ID, RowId, Value};
pub use validity::ValidityMask;
pub use value_vector::{SelectionVector, UnifiedFormat, ValueBuffer, ValueVector, VectorSource};

#[cfg(test)]
mod validity_test;
