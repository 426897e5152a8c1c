use std::sync::Arc;

use super::column_data::{ColumnData, ColumnRole};
use super::scan_state::{ColumnAppendState, ColumnScanState};
use crate::engine::core::block::BlockManager;
use crate::engine::core::stats::ColumnStats;
use crate::engine::core::storage_config::StorageConfig;
use crate::engine::core::update::TransactionData;
use crate::engine::core::vector::{LogicalType, RowId, Value, ValueVector};
use crate::engine::errors::StorageError;

/// Bitmask-only column: one boolean per row, no values. Nested variants use
/// it to persist their own top-level null information.
#[derive(Debug)]
pub struct ValidityColumnData {
    pub data: ColumnData,
}

impl ValidityColumnData {
    pub fn new(
        block_manager: Arc<dyn BlockManager>,
        config: StorageConfig,
        column_index: usize,
        start: RowId,
        role: ColumnRole,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            data: ColumnData::new(
                block_manager,
                config,
                column_index,
                start,
                LogicalType::Validity,
                role,
            )?,
        })
    }

    /// Appends the validity bits of `vector` as boolean rows.
    pub fn append_bits(
        &self,
        stats: &mut ColumnStats,
        state: &mut ColumnAppendState,
        vector: &ValueVector,
        count: usize,
    ) -> Result<(), StorageError> {
        let bits = ValueVector::from_values(
            LogicalType::Validity,
            (0..count).map(|i| Value::Boolean(vector.is_valid(i))).collect(),
        );
        self.data.append(stats, state, &bits, count)
    }

    /// Scans the bitmask for one vector block; `result[i]` is true when row
    /// `i` is valid.
    pub fn scan_bits(
        &self,
        transaction: TransactionData,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
    ) -> Result<usize, StorageError> {
        self.data.scan(transaction, vector_index, state, result)
    }

    /// Committed validity bits for an arbitrary row range.
    pub fn bits_range(&self, offset: u64, count: usize) -> Result<Vec<bool>, StorageError> {
        let mut bits = Vec::with_capacity(count);
        let vector_size = self.data.config().vector_size;
        let mut pulled = 0usize;
        while pulled < count {
            let chunk = (count - pulled).min(vector_size);
            let mut scratch = ValueVector::new(LogicalType::Validity);
            let scanned =
                self.data
                    .scan_committed_range(offset + pulled as u64, chunk, &mut scratch)?;
            if scanned == 0 {
                break;
            }
            for i in 0..scanned {
                bits.push(matches!(scratch.get(i), Value::Boolean(true)));
            }
            pulled += scanned;
        }
        Ok(bits)
    }

    /// Validity of a single row.
    pub fn bit_at(&self, row_offset: u64) -> Result<bool, StorageError> {
        Ok(self
            .bits_range(row_offset, 1)?
            .first()
            .copied()
            .unwrap_or(false))
    }
}
