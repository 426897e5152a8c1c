use std::sync::Arc;

use super::column_data::{ColumnData, ColumnRole};
use super::factory::{AnyColumnData, create_column};
use super::scan_state::{ColumnAppendState, ColumnFetchState, ColumnScanState, ScanMode};
use super::validity_column::ValidityColumnData;
use crate::engine::core::block::BlockManager;
use crate::engine::core::stats::ColumnStats;
use crate::engine::core::storage_config::StorageConfig;
use crate::engine::core::update::TransactionData;
use crate::engine::core::vector::{LogicalType, RowId, Value, ValueVector};
use crate::engine::errors::StorageError;

/// Variable-length list column: an end-offset stream in its own segments, a
/// validity stream, and a flattened element child column rooted at row 0.
#[derive(Debug)]
pub struct ListColumnData {
    ty: LogicalType,
    child_type: LogicalType,
    /// Cumulative end offsets into the element stream, one per list row.
    pub offsets: ColumnData,
    pub validity: ValidityColumnData,
    pub child: Box<AnyColumnData>,
}

impl ListColumnData {
    pub fn new(
        block_manager: Arc<dyn BlockManager>,
        config: StorageConfig,
        column_index: usize,
        start: RowId,
        child_type: LogicalType,
        role: ColumnRole,
    ) -> Result<Self, StorageError> {
        let offsets = ColumnData::new(
            Arc::clone(&block_manager),
            config.clone(),
            column_index,
            start,
            LogicalType::BigInt,
            role,
        )?;
        let validity = ValidityColumnData::new(
            Arc::clone(&block_manager),
            config.clone(),
            column_index,
            start,
            ColumnRole::Child,
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
            ty: LogicalType::List(Box::new(child_type.clone())),
            child_type,
            offsets,
            validity,
            child,
        })
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.ty
    }

    pub fn count(&self) -> u64 {
        self.offsets.count()
    }

    pub fn start(&self) -> RowId {
        self.offsets.start()
    }

    /// Element-stream offset where list row `row_rel` begins.
    fn prev_end(&self, row_rel: u64) -> Result<u64, StorageError> {
        if row_rel == 0 {
            return Ok(0);
        }
        let mut scratch = ValueVector::new(LogicalType::BigInt);
        let scanned = self.offsets.scan_committed_range(row_rel - 1, 1, &mut scratch)?;
        if scanned == 0 {
            return Err(StorageError::Internal(format!(
                "list offset for row {} missing",
                row_rel - 1
            )));
        }
        match scratch.get(0) {
            Value::BigInt(end) => Ok(end as u64),
            other => Err(StorageError::Corrupt(format!(
                "list offset column holds {:?}",
                other
            ))),
        }
    }

    pub fn initialize_append(&self, state: &mut ColumnAppendState) -> Result<(), StorageError> {
        self.offsets.initialize_append(state)?;
        state.child_appends.clear();
        state.child_appends.push(ColumnAppendState::default());
        state.child_appends.push(ColumnAppendState::default());
        self.validity
            .data
            .initialize_append(&mut state.child_appends[0])?;
        self.child.initialize_append(&mut state.child_appends[1])?;
        Ok(())
    }

    /// Decomposes list rows into offsets + validity + flattened elements and
    /// fans the appends out. Element values merge into `stats`; the offset
    /// and validity streams keep their bookkeeping out of it.
    pub fn append(
        &self,
        stats: &mut ColumnStats,
        state: &mut ColumnAppendState,
        vector: &ValueVector,
        count: usize,
    ) -> Result<(), StorageError> {
        let mut ends = ValueVector::new(LogicalType::BigInt);
        let mut elements = ValueVector::new(self.child_type.clone());
        let mut child_total = self.child.count();
        for i in 0..count {
            match vector.get(i) {
                Value::Null => {
                    stats.update(&Value::Null);
                    ends.push(Value::BigInt(child_total as i64));
                }
                Value::List(items) => {
                    child_total += items.len() as u64;
                    for item in items {
                        elements.push(item);
                    }
                    ends.push(Value::BigInt(child_total as i64));
                }
                other => {
                    return Err(StorageError::TypeMismatch {
                        expected: self.ty.name(),
                        actual: format!("{:?}", other),
                    });
                }
            }
        }

        let mut scratch = ColumnStats::new();
        self.validity
            .append_bits(&mut scratch, &mut state.child_appends[0], vector, count)?;
        let element_count = elements.len();
        if element_count > 0 {
            self.child
                .append(stats, &mut state.child_appends[1], &elements, element_count)?;
        }
        let mut scratch = ColumnStats::new();
        self.offsets.append(&mut scratch, state, &ends, count)
    }

    pub fn initialize_scan(&self, state: &mut ColumnScanState) {
        self.offsets.initialize_scan(state);
        state.child_states.clear();
        state.child_states.push(ColumnScanState::default());
        self.validity
            .data
            .initialize_scan(&mut state.child_states[0]);
    }

    pub fn initialize_scan_with_offset(
        &self,
        state: &mut ColumnScanState,
        row_idx: RowId,
    ) -> Result<(), StorageError> {
        self.offsets.initialize_scan_with_offset(state, row_idx)?;
        state.child_states.clear();
        state.child_states.push(ColumnScanState::default());
        self.validity
            .data
            .initialize_scan_with_offset(&mut state.child_states[0], row_idx)
    }

    pub fn scan_mode(
        &self,
        mode: ScanMode,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
    ) -> Result<usize, StorageError> {
        let start_rel = vector_index as u64 * self.offsets.config().vector_size as u64;
        let mut ends = ValueVector::new(LogicalType::BigInt);
        let n = self.offsets.scan_mode(mode, vector_index, state, &mut ends)?;
        if n == 0 {
            return Ok(0);
        }
        if state.child_states.is_empty() {
            state.child_states.push(ColumnScanState::default());
            self.validity
                .data
                .initialize_scan(&mut state.child_states[0]);
        }
        let mut bits = ValueVector::new(LogicalType::Validity);
        self.validity
            .data
            .scan_mode(mode, vector_index, &mut state.child_states[0], &mut bits)?;

        let prev = self.prev_end(start_rel)?;
        let last_end = match ends.get(n - 1) {
            Value::BigInt(end) => end as u64,
            other => {
                return Err(StorageError::Corrupt(format!(
                    "list offset column holds {:?}",
                    other
                )));
            }
        };
        let elements = self.child.scan_range(prev, (last_end - prev) as usize)?;

        result.clear();
        let mut cursor = prev;
        for i in 0..n {
            let end = match ends.get(i) {
                Value::BigInt(end) => end as u64,
                other => {
                    return Err(StorageError::Corrupt(format!(
                        "list offset column holds {:?}",
                        other
                    )));
                }
            };
            let valid = matches!(bits.get(i), Value::Boolean(true));
            if valid {
                let slice = elements[(cursor - prev) as usize..(end - prev) as usize].to_vec();
                result.push(Value::List(slice));
            } else {
                result.push(Value::Null);
            }
            cursor = end;
        }
        Ok(n)
    }

    /// Committed list values for an arbitrary row range.
    pub fn scan_range(&self, offset: u64, count: usize) -> Result<Vec<Value>, StorageError> {
        let mut ends_vec = ValueVector::new(LogicalType::BigInt);
        let scanned = self.offsets.scan_committed_range(offset, count, &mut ends_vec)?;
        let bits = self.validity.bits_range(offset, scanned)?;
        let prev = self.prev_end(offset)?;

        let mut values = Vec::with_capacity(scanned);
        let mut cursor = prev;
        for i in 0..scanned {
            let end = match ends_vec.get(i) {
                Value::BigInt(end) => end as u64,
                other => {
                    return Err(StorageError::Corrupt(format!(
                        "list offset column holds {:?}",
                        other
                    )));
                }
            };
            if bits.get(i).copied().unwrap_or(false) {
                let elements = self.child.scan_range(cursor, (end - cursor) as usize)?;
                values.push(Value::List(elements));
            } else {
                values.push(Value::Null);
            }
            cursor = end;
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
        let rel = row_id - self.offsets.start();
        let value = self
            .scan_range(rel, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                StorageError::Internal(format!("list row {} outside storage", row_id))
            })?;
        result.resize(result_idx + 1);
        result.set(result_idx, value);
        Ok(())
    }

    /// The offsets and element streams are append-only; in-place updates of
    /// list rows are not supported.
    pub fn update(
        &self,
        _transaction: TransactionData,
        _column_index: usize,
        _update_vector: &ValueVector,
        _row_ids: &[RowId],
    ) -> Result<(), StorageError> {
        Err(StorageError::Internal(
            "updates on list columns are not supported".to_string(),
        ))
    }

    pub fn revert_append(&self, start_row: RowId) -> Result<(), StorageError> {
        let rel = start_row.saturating_sub(self.offsets.start());
        if rel >= self.count() {
            return Ok(());
        }
        // element boundary must be read before the offsets are truncated
        let keep_elements = self.prev_end(rel)?;
        self.offsets.revert_append(start_row)?;
        self.validity.data.revert_append(start_row)?;
        self.child.revert_append(keep_elements)
    }
}
