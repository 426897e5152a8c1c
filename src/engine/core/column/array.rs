use std::sync::Arc;

use super::column_data::ColumnRole;
use super::factory::{AnyColumnData, create_column};
use super::scan_state::{ColumnAppendState, ColumnFetchState, ColumnScanState, ScanMode};
use super::validity_column::ValidityColumnData;
use crate::engine::core::block::BlockManager;
use crate::engine::core::stats::ColumnStats;
use crate::engine::core::storage_config::StorageConfig;
use crate::engine::core::update::TransactionData;
use crate::engine::core::vector::{LogicalType, RowId, Value, ValueVector};
use crate::engine::errors::StorageError;

/// Fixed-size array column: a validity stream plus one element child sized
/// by a static multiplier. No offsets are needed — element row `r * size`
/// starts array row `r`.
#[derive(Debug)]
pub struct ArrayColumnData {
    ty: LogicalType,
    child_type: LogicalType,
    array_size: usize,
    pub validity: ValidityColumnData,
    pub child: Box<AnyColumnData>,
}

impl ArrayColumnData {
    pub fn new(
        block_manager: Arc<dyn BlockManager>,
        config: StorageConfig,
        column_index: usize,
        start: RowId,
        child_type: LogicalType,
        array_size: usize,
        role: ColumnRole,
    ) -> Result<Self, StorageError> {
        if array_size == 0 {
            return Err(StorageError::Internal(
                "array column with zero element count".to_string(),
            ));
        }
        let validity = ValidityColumnData::new(
            Arc::clone(&block_manager),
            config.clone(),
            column_index,
            start,
            role,
        )?;
        let child = Box::new(create_column(
            block_manager,
            config,
            column_index,
            0,
            child_type.clone(),
            ColumnRole::Child,
        )?);
        Ok(Self {
            ty: LogicalType::Array(Box::new(child_type.clone()), array_size),
            child_type,
            array_size,
            validity,
            child,
        })
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.ty
    }

    pub fn array_size(&self) -> usize {
        self.array_size
    }

    pub fn count(&self) -> u64 {
        self.validity.data.count()
    }

    pub fn start(&self) -> RowId {
        self.validity.data.start()
    }

    pub fn initialize_append(&self, state: &mut ColumnAppendState) -> Result<(), StorageError> {
        self.validity.data.initialize_append(state)?;
        state.child_appends.clear();
        let mut child_state = ColumnAppendState::default();
        self.child.initialize_append(&mut child_state)?;
        state.child_appends.push(child_state);
        Ok(())
    }

    /// Fans each array row out into exactly `array_size` element rows; a
    /// null row contributes `array_size` null elements to keep the streams
    /// aligned.
    pub fn append(
        &self,
        stats: &mut ColumnStats,
        state: &mut ColumnAppendState,
        vector: &ValueVector,
        count: usize,
    ) -> Result<(), StorageError> {
        let mut elements = ValueVector::new(self.child_type.clone());
        for i in 0..count {
            match vector.get(i) {
                Value::Null => {
                    stats.update(&Value::Null);
                    for _ in 0..self.array_size {
                        elements.push(Value::Null);
                    }
                }
                Value::Array(items) => {
                    if items.len() != self.array_size {
                        return Err(StorageError::TypeMismatch {
                            expected: self.ty.name(),
                            actual: format!("array of {} elements", items.len()),
                        });
                    }
                    for item in items {
                        elements.push(item);
                    }
                }
                other => {
                    return Err(StorageError::TypeMismatch {
                        expected: self.ty.name(),
                        actual: format!("{:?}", other),
                    });
                }
            }
        }
        let element_count = elements.len();
        self.child
            .append(stats, &mut state.child_appends[0], &elements, element_count)?;
        let mut scratch = ColumnStats::new();
        self.validity.append_bits(&mut scratch, state, vector, count)
    }

    pub fn initialize_scan(&self, state: &mut ColumnScanState) {
        self.validity.data.initialize_scan(state);
        state.child_states.clear();
    }

    pub fn initialize_scan_with_offset(
        &self,
        state: &mut ColumnScanState,
        row_idx: RowId,
    ) -> Result<(), StorageError> {
        state.child_states.clear();
        self.validity.data.initialize_scan_with_offset(state, row_idx)
    }

    pub fn scan_mode(
        &self,
        mode: ScanMode,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
    ) -> Result<usize, StorageError> {
        let start_rel = vector_index as u64 * self.validity.data.config().vector_size as u64;
        let mut bits = ValueVector::new(LogicalType::Validity);
        let n = self
            .validity
            .data
            .scan_mode(mode, vector_index, state, &mut bits)?;
        if n == 0 {
            return Ok(0);
        }
        let elements = self
            .child
            .scan_range(start_rel * self.array_size as u64, n * self.array_size)?;

        result.clear();
        for row in 0..n {
            if matches!(bits.get(row), Value::Boolean(true)) {
                let from = row * self.array_size;
                result.push(Value::Array(elements[from..from + self.array_size].to_vec()));
            } else {
                result.push(Value::Null);
            }
        }
        Ok(n)
    }

    /// Committed array values for an arbitrary row range.
    pub fn scan_range(&self, offset: u64, count: usize) -> Result<Vec<Value>, StorageError> {
        let bits = self.validity.bits_range(offset, count)?;
        let n = bits.len();
        let elements = self
            .child
            .scan_range(offset * self.array_size as u64, n * self.array_size)?;
        let mut values = Vec::with_capacity(n);
        for row in 0..n {
            if bits[row] {
                let from = row * self.array_size;
                values.push(Value::Array(elements[from..from + self.array_size].to_vec()));
            } else {
                values.push(Value::Null);
            }
        }
        Ok(values)
    }

    pub fn fetch_row(
        &self,
        _transaction: TransactionData,
        _state: &mut ColumnFetchState,
        row_id: RowId,
        result: &mut ValueVector,
        result_idx: usize,
    ) -> Result<(), StorageError> {
        let rel = row_id - self.start();
        let value = self
            .scan_range(rel, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                StorageError::Internal(format!("array row {} outside storage", row_id))
            })?;
        result.resize(result_idx + 1);
        result.set(result_idx, value);
        Ok(())
    }

    /// The element stream is append-only; in-place updates of array rows
    /// are not supported.
    pub fn update(
        &self,
        _transaction: TransactionData,
        _column_index: usize,
        _update_vector: &ValueVector,
        _row_ids: &[RowId],
    ) -> Result<(), StorageError> {
        Err(StorageError::Internal(
            "updates on array columns are not supported".to_string(),
        ))
    }

    pub fn revert_append(&self, start_row: RowId) -> Result<(), StorageError> {
        let rel = start_row.saturating_sub(self.start());
        if rel >= self.count() {
            return Ok(());
        }
        self.validity.data.revert_append(start_row)?;
        self.child.revert_append(rel * self.array_size as u64)
    }
}
