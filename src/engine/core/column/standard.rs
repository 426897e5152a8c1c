use std::sync::Arc;

use super::column_data::{ColumnData, ColumnRole};
use super::scan_state::{ColumnAppendState, ColumnFetchState, ColumnScanState};
use crate::engine::core::block::BlockManager;
use crate::engine::core::stats::ColumnStats;
use crate::engine::core::storage_config::StorageConfig;
use crate::engine::core::update::TransactionData;
use crate::engine::core::vector::{LogicalType, RowId, Value, ValueVector};
use crate::engine::errors::StorageError;

/// Flat column of a primitive type. Values and their validity travel
/// together through the segment payload, so no separate bitmask column is
/// needed.
#[derive(Debug)]
pub struct StandardColumnData {
    pub data: ColumnData,
}

impl StandardColumnData {
    pub fn new(
        block_manager: Arc<dyn BlockManager>,
        config: StorageConfig,
        column_index: usize,
        start: RowId,
        ty: LogicalType,
        role: ColumnRole,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            data: ColumnData::new(block_manager, config, column_index, start, ty, role)?,
        })
    }

    pub fn append(
        &self,
        stats: &mut ColumnStats,
        state: &mut ColumnAppendState,
        vector: &ValueVector,
        count: usize,
    ) -> Result<(), StorageError> {
        self.data.append(stats, state, vector, count)
    }

    pub fn scan(
        &self,
        transaction: TransactionData,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
    ) -> Result<usize, StorageError> {
        self.data.scan(transaction, vector_index, state, result)
    }

    pub fn scan_committed(
        &self,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
        allow_updates: bool,
    ) -> Result<usize, StorageError> {
        self.data
            .scan_committed(vector_index, state, result, allow_updates)
    }

    /// Committed values for an arbitrary row range, pulled in vector-sized
    /// chunks.
    pub fn scan_range(&self, offset: u64, count: usize) -> Result<Vec<Value>, StorageError> {
        let mut values = Vec::with_capacity(count);
        let vector_size = self.data.config().vector_size;
        let mut pulled = 0usize;
        while pulled < count {
            let chunk = (count - pulled).min(vector_size);
            let mut scratch = ValueVector::new(self.data.logical_type().clone());
            let scanned =
                self.data
                    .scan_committed_range(offset + pulled as u64, chunk, &mut scratch)?;
            if scanned == 0 {
                break;
            }
            for i in 0..scanned {
                values.push(scratch.get(i));
            }
            pulled += scanned;
        }
        Ok(values)
    }

    pub fn fetch_row(
        &self,
        transaction: TransactionData,
        state: &mut ColumnFetchState,
        row_id: RowId,
        result: &mut ValueVector,
        result_idx: usize,
    ) -> Result<(), StorageError> {
        self.data
            .fetch_row(transaction, state, row_id, result, result_idx)
    }
}
