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

/// Struct column: stores nothing itself but a validity mask; every field
/// lives in its own child column sharing the same row space.
#[derive(Debug)]
pub struct StructColumnData {
    ty: LogicalType,
    fields: Vec<(String, LogicalType)>,
    pub validity: ValidityColumnData,
    pub children: Vec<AnyColumnData>,
}

impl StructColumnData {
    pub fn new(
        block_manager: Arc<dyn BlockManager>,
        config: StorageConfig,
        column_index: usize,
        start: RowId,
        fields: Vec<(String, LogicalType)>,
        role: ColumnRole,
    ) -> Result<Self, StorageError> {
        let validity = ValidityColumnData::new(
            Arc::clone(&block_manager),
            config.clone(),
            column_index,
            start,
            role,
        )?;
        let mut children = Vec::with_capacity(fields.len());
        for (i, (_, field_ty)) in fields.iter().enumerate() {
            children.push(create_column(
                Arc::clone(&block_manager),
                config.clone(),
                i,
                start,
                field_ty.clone(),
                ColumnRole::Child,
            )?);
        }
        Ok(Self {
            ty: LogicalType::Struct(fields.clone()),
            fields,
            validity,
            children,
        })
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.ty
    }

    pub fn count(&self) -> u64 {
        self.validity.data.count()
    }

    pub fn start(&self) -> RowId {
        self.validity.data.start()
    }

    fn field_vector(
        &self,
        vector: &ValueVector,
        field: usize,
        count: usize,
    ) -> Result<ValueVector, StorageError> {
        let mut values = ValueVector::new(self.fields[field].1.clone());
        for i in 0..count {
            match vector.get(i) {
                Value::Null => values.push(Value::Null),
                Value::Struct(mut row) => {
                    if field >= row.len() {
                        return Err(StorageError::TypeMismatch {
                            expected: self.ty.name(),
                            actual: format!("struct with {} fields", row.len()),
                        });
                    }
                    values.push(row.swap_remove(field));
                }
                other => {
                    return Err(StorageError::TypeMismatch {
                        expected: self.ty.name(),
                        actual: format!("{:?}", other),
                    });
                }
            }
        }
        Ok(values)
    }

    pub fn initialize_append(&self, state: &mut ColumnAppendState) -> Result<(), StorageError> {
        self.validity.data.initialize_append(state)?;
        state.child_appends.clear();
        for child in &self.children {
            let mut child_state = ColumnAppendState::default();
            child.initialize_append(&mut child_state)?;
            state.child_appends.push(child_state);
        }
        Ok(())
    }

    pub fn append(
        &self,
        stats: &mut ColumnStats,
        state: &mut ColumnAppendState,
        vector: &ValueVector,
        count: usize,
    ) -> Result<(), StorageError> {
        for (i, child) in self.children.iter().enumerate() {
            let field_vec = self.field_vector(vector, i, count)?;
            child.append(stats, &mut state.child_appends[i], &field_vec, count)?;
        }
        let mut scratch = ColumnStats::new();
        self.validity.append_bits(&mut scratch, state, vector, count)
    }

    pub fn initialize_scan(&self, state: &mut ColumnScanState) {
        self.validity.data.initialize_scan(state);
        state.child_states.clear();
        for child in &self.children {
            let mut child_state = ColumnScanState::default();
            child.initialize_scan(&mut child_state);
            state.child_states.push(child_state);
        }
    }

    pub fn initialize_scan_with_offset(
        &self,
        state: &mut ColumnScanState,
        row_idx: RowId,
    ) -> Result<(), StorageError> {
        self.validity.data.initialize_scan_with_offset(state, row_idx)?;
        state.child_states.clear();
        for child in &self.children {
            let mut child_state = ColumnScanState::default();
            child.initialize_scan_with_offset(&mut child_state, row_idx)?;
            state.child_states.push(child_state);
        }
        Ok(())
    }

    pub fn scan_mode(
        &self,
        mode: ScanMode,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
    ) -> Result<usize, StorageError> {
        let mut bits = ValueVector::new(LogicalType::Validity);
        let n = self
            .validity
            .data
            .scan_mode(mode, vector_index, state, &mut bits)?;
        if n == 0 {
            return Ok(0);
        }
        if state.child_states.len() != self.children.len() {
            state.child_states.clear();
            for child in &self.children {
                let mut child_state = ColumnScanState::default();
                child.initialize_scan(&mut child_state);
                state.child_states.push(child_state);
            }
        }
        let mut field_results = Vec::with_capacity(self.children.len());
        for (i, child) in self.children.iter().enumerate() {
            let mut field_result = ValueVector::new(self.fields[i].1.clone());
            child.scan_mode(mode, vector_index, &mut state.child_states[i], &mut field_result)?;
            field_results.push(field_result);
        }

        result.clear();
        for row in 0..n {
            if matches!(bits.get(row), Value::Boolean(true)) {
                let fields = field_results
                    .iter()
                    .map(|field| field.get(row))
                    .collect::<Vec<_>>();
                result.push(Value::Struct(fields));
            } else {
                result.push(Value::Null);
            }
        }
        Ok(n)
    }

    /// Committed struct values for an arbitrary row range.
    pub fn scan_range(&self, offset: u64, count: usize) -> Result<Vec<Value>, StorageError> {
        let bits = self.validity.bits_range(offset, count)?;
        let n = bits.len();
        let mut field_values = Vec::with_capacity(self.children.len());
        for child in &self.children {
            field_values.push(child.scan_range(offset, n)?);
        }
        let mut values = Vec::with_capacity(n);
        for row in 0..n {
            if bits[row] {
                let fields = field_values
                    .iter()
                    .map(|field| field[row].clone())
                    .collect::<Vec<_>>();
                values.push(Value::Struct(fields));
            } else {
                values.push(Value::Null);
            }
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
        let rel = row_id - self.start();
        let valid = self.validity.bit_at(rel)?;
        if !valid {
            result.resize(result_idx + 1);
            result.set(result_idx, Value::Null);
            return Ok(());
        }
        if state.child_states.len() != self.children.len() {
            state.child_states.clear();
            state
                .child_states
                .resize_with(self.children.len(), ColumnFetchState::default);
        }
        let mut fields = Vec::with_capacity(self.children.len());
        for (i, child) in self.children.iter().enumerate() {
            let mut scratch = ValueVector::new(self.fields[i].1.clone());
            child.fetch_row(
                transaction,
                &mut state.child_states[i],
                row_id,
                &mut scratch,
                0,
            )?;
            fields.push(scratch.get(0));
        }
        result.resize(result_idx + 1);
        result.set(result_idx, Value::Struct(fields));
        Ok(())
    }

    /// Updates every field of the given rows from struct-typed values.
    pub fn update(
        &self,
        transaction: TransactionData,
        _column_index: usize,
        update_vector: &ValueVector,
        row_ids: &[RowId],
    ) -> Result<(), StorageError> {
        for (i, child) in self.children.iter().enumerate() {
            let field_vec = self.field_vector(update_vector, i, row_ids.len())?;
            child.update(transaction, i, &field_vec, row_ids)?;
        }
        Ok(())
    }

    /// Recurses into the child named by `column_path[depth]`; at the end of
    /// the path the whole struct is updated.
    pub fn update_column(
        &self,
        transaction: TransactionData,
        column_path: &[usize],
        update_vector: &ValueVector,
        row_ids: &[RowId],
        depth: usize,
    ) -> Result<(), StorageError> {
        if depth >= column_path.len() {
            return self.update(transaction, 0, update_vector, row_ids);
        }
        let child_index = column_path[depth];
        let child = self.children.get(child_index).ok_or_else(|| {
            StorageError::Internal(format!(
                "struct column path {} out of range",
                child_index
            ))
        })?;
        child.update_column(transaction, column_path, update_vector, row_ids, depth + 1)
    }

    pub fn revert_append(&self, start_row: RowId) -> Result<(), StorageError> {
        self.validity.data.revert_append(start_row)?;
        for child in &self.children {
            child.revert_append(start_row)?;
        }
        Ok(())
    }
}
