use std::sync::Arc;

use super::array::ArrayColumnData;
use super::column_data::{ColumnData, ColumnRole, ColumnSegmentInfo};
use super::list::ListColumnData;
use super::scan_state::{ColumnAppendState, ColumnFetchState, ColumnScanState, ScanMode};
use super::standard::StandardColumnData;
use super::struct_column::StructColumnData;
use super::validity_column::ValidityColumnData;
use crate::engine::core::block::BlockManager;
use crate::engine::core::checkpoint::{CheckpointInfo, CheckpointResult};
use crate::engine::core::stats::{ColumnStats, ZoneFilter};
use crate::engine::core::storage_config::StorageConfig;
use crate::engine::core::update::TransactionData;
use crate::engine::core::vector::{LogicalType, RowId, Value, ValueVector};
use crate::engine::errors::{CheckpointError, StorageError};

/// Checkpoint output of a column and its nested children, mirroring the
/// column's structure so it can be deserialized back into an equivalent
/// tree.
#[derive(Debug, Default)]
pub struct ColumnCheckpointResult {
    pub own: CheckpointResult,
    pub children: Vec<ColumnCheckpointResult>,
}

/// Chooses the concrete column implementation for a logical type.
pub fn create_column(
    block_manager: Arc<dyn BlockManager>,
    config: StorageConfig,
    column_index: usize,
    start: RowId,
    ty: LogicalType,
    role: ColumnRole,
) -> Result<AnyColumnData, StorageError> {
    match ty {
        LogicalType::Struct(fields) => Ok(AnyColumnData::Struct(StructColumnData::new(
            block_manager,
            config,
            column_index,
            start,
            fields,
            role,
        )?)),
        LogicalType::List(child) => Ok(AnyColumnData::List(ListColumnData::new(
            block_manager,
            config,
            column_index,
            start,
            *child,
            role,
        )?)),
        LogicalType::Array(child, size) => Ok(AnyColumnData::Array(ArrayColumnData::new(
            block_manager,
            config,
            column_index,
            start,
            *child,
            size,
            role,
        )?)),
        LogicalType::Validity => Ok(AnyColumnData::Validity(ValidityColumnData::new(
            block_manager,
            config,
            column_index,
            start,
            role,
        )?)),
        other => Ok(AnyColumnData::Standard(StandardColumnData::new(
            block_manager,
            config,
            column_index,
            start,
            other,
            role,
        )?)),
    }
}

/// Closed set of column implementations sharing the append/scan/update/
/// checkpoint contracts. Nested variants fan operations out to owned child
/// instances of the same type.
#[derive(Debug)]
pub enum AnyColumnData {
    Standard(StandardColumnData),
    Validity(ValidityColumnData),
    List(ListColumnData),
    Struct(StructColumnData),
    Array(ArrayColumnData),
}

impl AnyColumnData {
    /// The column-data instance that owns this variant's row count, scan
    /// cursor, and (for roots) statistics.
    fn primary(&self) -> &ColumnData {
        match self {
            AnyColumnData::Standard(c) => &c.data,
            AnyColumnData::Validity(c) => &c.data,
            AnyColumnData::List(c) => &c.offsets,
            AnyColumnData::Struct(c) => &c.validity.data,
            AnyColumnData::Array(c) => &c.validity.data,
        }
    }

    pub fn logical_type(&self) -> &LogicalType {
        match self {
            AnyColumnData::Standard(c) => c.data.logical_type(),
            AnyColumnData::Validity(c) => c.data.logical_type(),
            AnyColumnData::List(c) => c.logical_type(),
            AnyColumnData::Struct(c) => c.logical_type(),
            AnyColumnData::Array(c) => c.logical_type(),
        }
    }

    pub fn count(&self) -> u64 {
        self.primary().count()
    }

    pub fn start(&self) -> RowId {
        self.primary().start()
    }

    pub fn initialize_append(&self, state: &mut ColumnAppendState) -> Result<(), StorageError> {
        match self {
            AnyColumnData::Standard(c) => c.data.initialize_append(state),
            AnyColumnData::Validity(c) => c.data.initialize_append(state),
            AnyColumnData::List(c) => c.initialize_append(state),
            AnyColumnData::Struct(c) => c.initialize_append(state),
            AnyColumnData::Array(c) => c.initialize_append(state),
        }
    }

    pub fn append(
        &self,
        stats: &mut ColumnStats,
        state: &mut ColumnAppendState,
        vector: &ValueVector,
        count: usize,
    ) -> Result<(), StorageError> {
        match self {
            AnyColumnData::Standard(c) => c.append(stats, state, vector, count),
            AnyColumnData::Validity(c) => c.append_bits(stats, state, vector, count),
            AnyColumnData::List(c) => c.append(stats, state, vector, count),
            AnyColumnData::Struct(c) => c.append(stats, state, vector, count),
            AnyColumnData::Array(c) => c.append(stats, state, vector, count),
        }
    }

    /// Append through the root's own statistics; a fatal error on a child.
    pub fn append_with_own_stats(
        &self,
        state: &mut ColumnAppendState,
        vector: &ValueVector,
        count: usize,
    ) -> Result<(), StorageError> {
        self.primary()
            .with_own_stats(|stats| self.append(stats, state, vector, count))?
    }

    pub fn initialize_scan(&self, state: &mut ColumnScanState) {
        match self {
            AnyColumnData::Standard(c) => c.data.initialize_scan(state),
            AnyColumnData::Validity(c) => c.data.initialize_scan(state),
            AnyColumnData::List(c) => c.initialize_scan(state),
            AnyColumnData::Struct(c) => c.initialize_scan(state),
            AnyColumnData::Array(c) => c.initialize_scan(state),
        }
    }

    pub fn initialize_scan_with_offset(
        &self,
        state: &mut ColumnScanState,
        row_idx: RowId,
    ) -> Result<(), StorageError> {
        match self {
            AnyColumnData::Standard(c) => c.data.initialize_scan_with_offset(state, row_idx),
            AnyColumnData::Validity(c) => c.data.initialize_scan_with_offset(state, row_idx),
            AnyColumnData::List(c) => c.initialize_scan_with_offset(state, row_idx),
            AnyColumnData::Struct(c) => c.initialize_scan_with_offset(state, row_idx),
            AnyColumnData::Array(c) => c.initialize_scan_with_offset(state, row_idx),
        }
    }

    pub fn scan_mode(
        &self,
        mode: ScanMode,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
    ) -> Result<usize, StorageError> {
        match self {
            AnyColumnData::Standard(c) => c.data.scan_mode(mode, vector_index, state, result),
            AnyColumnData::Validity(c) => c.data.scan_mode(mode, vector_index, state, result),
            AnyColumnData::List(c) => c.scan_mode(mode, vector_index, state, result),
            AnyColumnData::Struct(c) => c.scan_mode(mode, vector_index, state, result),
            AnyColumnData::Array(c) => c.scan_mode(mode, vector_index, state, result),
        }
    }

    pub fn scan(
        &self,
        transaction: TransactionData,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
    ) -> Result<usize, StorageError> {
        self.scan_mode(ScanMode::Transactional(transaction), vector_index, state, result)
    }

    pub fn scan_committed(
        &self,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
        allow_updates: bool,
    ) -> Result<usize, StorageError> {
        self.scan_mode(
            ScanMode::Committed { allow_updates },
            vector_index,
            state,
            result,
        )
    }

    /// Committed values for an arbitrary row range, assembled recursively
    /// for nested variants.
    pub fn scan_range(&self, offset: u64, count: usize) -> Result<Vec<Value>, StorageError> {
        match self {
            AnyColumnData::Standard(c) => c.scan_range(offset, count),
            AnyColumnData::Validity(c) => Ok(c
                .bits_range(offset, count)?
                .into_iter()
                .map(Value::Boolean)
                .collect()),
            AnyColumnData::List(c) => c.scan_range(offset, count),
            AnyColumnData::Struct(c) => c.scan_range(offset, count),
            AnyColumnData::Array(c) => c.scan_range(offset, count),
        }
    }

    pub fn fetch_row(
        &self,
        transaction: TransactionData,
        state: &mut ColumnFetchState,
        row_id: RowId,
        result: &mut ValueVector,
        result_idx: usize,
    ) -> Result<(), StorageError> {
        match self {
            AnyColumnData::Standard(c) => {
                c.fetch_row(transaction, state, row_id, result, result_idx)
            }
            AnyColumnData::Validity(c) => {
                c.data.fetch_row(transaction, state, row_id, result, result_idx)
            }
            AnyColumnData::List(c) => c.fetch_row(transaction, state, row_id, result, result_idx),
            AnyColumnData::Struct(c) => {
                c.fetch_row(transaction, state, row_id, result, result_idx)
            }
            AnyColumnData::Array(c) => c.fetch_row(transaction, state, row_id, result, result_idx),
        }
    }

    pub fn update(
        &self,
        transaction: TransactionData,
        column_index: usize,
        update_vector: &ValueVector,
        row_ids: &[RowId],
    ) -> Result<(), StorageError> {
        match self {
            AnyColumnData::Standard(c) => {
                c.data.update(transaction, column_index, update_vector, row_ids)
            }
            AnyColumnData::Validity(c) => {
                c.data.update(transaction, column_index, update_vector, row_ids)
            }
            AnyColumnData::List(c) => c.update(transaction, column_index, update_vector, row_ids),
            AnyColumnData::Struct(c) => {
                c.update(transaction, column_index, update_vector, row_ids)
            }
            AnyColumnData::Array(c) => c.update(transaction, column_index, update_vector, row_ids),
        }
    }

    pub fn update_column(
        &self,
        transaction: TransactionData,
        column_path: &[usize],
        update_vector: &ValueVector,
        row_ids: &[RowId],
        depth: usize,
    ) -> Result<(), StorageError> {
        match self {
            AnyColumnData::Standard(c) => {
                c.data
                    .update_column(transaction, column_path, update_vector, row_ids, depth)
            }
            AnyColumnData::Validity(c) => {
                c.data
                    .update_column(transaction, column_path, update_vector, row_ids, depth)
            }
            AnyColumnData::Struct(c) => {
                c.update_column(transaction, column_path, update_vector, row_ids, depth)
            }
            AnyColumnData::List(c) => c.update(transaction, 0, update_vector, row_ids),
            AnyColumnData::Array(c) => c.update(transaction, 0, update_vector, row_ids),
        }
    }

    pub fn revert_append(&self, start_row: RowId) -> Result<(), StorageError> {
        match self {
            AnyColumnData::Standard(c) => c.data.revert_append(start_row),
            AnyColumnData::Validity(c) => c.data.revert_append(start_row),
            AnyColumnData::List(c) => c.revert_append(start_row),
            AnyColumnData::Struct(c) => c.revert_append(start_row),
            AnyColumnData::Array(c) => c.revert_append(start_row),
        }
    }

    pub fn has_updates(&self) -> bool {
        match self {
            AnyColumnData::Standard(c) => c.data.has_updates(),
            AnyColumnData::Validity(c) => c.data.has_updates(),
            AnyColumnData::List(c) => {
                c.offsets.has_updates()
                    || c.validity.data.has_updates()
                    || c.child.has_updates()
            }
            AnyColumnData::Struct(c) => {
                c.validity.data.has_updates()
                    || c.children.iter().any(|child| child.has_updates())
            }
            AnyColumnData::Array(c) => {
                c.validity.data.has_updates() || c.child.has_updates()
            }
        }
    }

    pub fn clear_updates(&self) {
        match self {
            AnyColumnData::Standard(c) => c.data.clear_updates(),
            AnyColumnData::Validity(c) => c.data.clear_updates(),
            AnyColumnData::List(c) => {
                c.offsets.clear_updates();
                c.validity.data.clear_updates();
                c.child.clear_updates();
            }
            AnyColumnData::Struct(c) => {
                c.validity.data.clear_updates();
                for child in &c.children {
                    child.clear_updates();
                }
            }
            AnyColumnData::Array(c) => {
                c.validity.data.clear_updates();
                c.child.clear_updates();
            }
        }
    }

    /// Commits pending overlay versions across the column tree.
    pub fn commit_updates(&self, transaction_id: u64, commit_id: u64) {
        match self {
            AnyColumnData::Standard(c) => c.data.commit_updates(transaction_id, commit_id),
            AnyColumnData::Validity(c) => c.data.commit_updates(transaction_id, commit_id),
            AnyColumnData::List(c) => {
                c.offsets.commit_updates(transaction_id, commit_id);
                c.validity.data.commit_updates(transaction_id, commit_id);
                c.child.commit_updates(transaction_id, commit_id);
            }
            AnyColumnData::Struct(c) => {
                c.validity.data.commit_updates(transaction_id, commit_id);
                for child in &c.children {
                    child.commit_updates(transaction_id, commit_id);
                }
            }
            AnyColumnData::Array(c) => {
                c.validity.data.commit_updates(transaction_id, commit_id);
                c.child.commit_updates(transaction_id, commit_id);
            }
        }
    }

    /// Rolls back pending overlay versions across the column tree.
    pub fn rollback_updates(&self, transaction_id: u64) {
        match self {
            AnyColumnData::Standard(c) => c.data.rollback_updates(transaction_id),
            AnyColumnData::Validity(c) => c.data.rollback_updates(transaction_id),
            AnyColumnData::List(c) => {
                c.offsets.rollback_updates(transaction_id);
                c.validity.data.rollback_updates(transaction_id);
                c.child.rollback_updates(transaction_id);
            }
            AnyColumnData::Struct(c) => {
                c.validity.data.rollback_updates(transaction_id);
                for child in &c.children {
                    child.rollback_updates(transaction_id);
                }
            }
            AnyColumnData::Array(c) => {
                c.validity.data.rollback_updates(transaction_id);
                c.child.rollback_updates(transaction_id);
            }
        }
    }

    pub fn get_statistics(&self) -> Result<ColumnStats, StorageError> {
        self.primary().get_statistics()
    }

    pub fn check_zonemap(&self, filter: &ZoneFilter) -> Result<bool, StorageError> {
        self.primary().check_zonemap(filter)
    }

    /// Checkpoints the column tree, producing one result node per owned
    /// column-data instance.
    pub fn checkpoint(
        &self,
        info: CheckpointInfo,
    ) -> Result<ColumnCheckpointResult, CheckpointError> {
        match self {
            AnyColumnData::Standard(c) => Ok(ColumnCheckpointResult {
                own: c.data.checkpoint(info)?,
                children: Vec::new(),
            }),
            AnyColumnData::Validity(c) => Ok(ColumnCheckpointResult {
                own: c.data.checkpoint(info)?,
                children: Vec::new(),
            }),
            AnyColumnData::List(c) => Ok(ColumnCheckpointResult {
                own: c.offsets.checkpoint(info.clone())?,
                children: vec![
                    ColumnCheckpointResult {
                        own: c.validity.data.checkpoint(info.clone())?,
                        children: Vec::new(),
                    },
                    c.child.checkpoint(info)?,
                ],
            }),
            AnyColumnData::Struct(c) => {
                let own = c.validity.data.checkpoint(info.clone())?;
                let mut children = Vec::with_capacity(c.children.len());
                for child in &c.children {
                    children.push(child.checkpoint(info.clone())?);
                }
                Ok(ColumnCheckpointResult { own, children })
            }
            AnyColumnData::Array(c) => Ok(ColumnCheckpointResult {
                own: c.validity.data.checkpoint(info.clone())?,
                children: vec![c.child.checkpoint(info)?],
            }),
        }
    }

    /// Rebuilds the column tree from the persisted checkpoint structure.
    pub fn deserialize_tree(
        &self,
        persisted: &ColumnCheckpointResult,
    ) -> Result<(), StorageError> {
        fn restore(data: &ColumnData, node: &CheckpointResult) -> Result<(), StorageError> {
            let mut stats = ColumnStats::new();
            data.deserialize(node.data_pointers.clone(), &mut stats)?;
            if data.role() == ColumnRole::Root {
                data.with_own_stats(|own| *own = stats)?;
            }
            Ok(())
        }

        match self {
            AnyColumnData::Standard(c) => restore(&c.data, &persisted.own),
            AnyColumnData::Validity(c) => restore(&c.data, &persisted.own),
            AnyColumnData::List(c) => {
                if persisted.children.len() != 2 {
                    return Err(StorageError::Corrupt(
                        "list column checkpoint without validity/element children".to_string(),
                    ));
                }
                restore(&c.offsets, &persisted.own)?;
                restore(&c.validity.data, &persisted.children[0].own)?;
                c.child.deserialize_tree(&persisted.children[1])
            }
            AnyColumnData::Struct(c) => {
                if persisted.children.len() != c.children.len() {
                    return Err(StorageError::Corrupt(format!(
                        "struct column checkpoint holds {} children, expected {}",
                        persisted.children.len(),
                        c.children.len()
                    )));
                }
                restore(&c.validity.data, &persisted.own)?;
                for (child, node) in c.children.iter().zip(&persisted.children) {
                    child.deserialize_tree(node)?;
                }
                Ok(())
            }
            AnyColumnData::Array(c) => {
                if persisted.children.len() != 1 {
                    return Err(StorageError::Corrupt(
                        "array column checkpoint without element child".to_string(),
                    ));
                }
                restore(&c.validity.data, &persisted.own)?;
                c.child.deserialize_tree(&persisted.children[0])
            }
        }
    }

    /// Per-segment diagnostics for the whole column tree; child columns
    /// extend the column path.
    pub fn get_column_segment_info(
        &self,
        row_group_index: usize,
        col_path: &[usize],
    ) -> Vec<ColumnSegmentInfo> {
        let mut result = self
            .primary()
            .get_column_segment_info(row_group_index, col_path);
        let children: Vec<&AnyColumnData> = match self {
            AnyColumnData::Standard(_) | AnyColumnData::Validity(_) => Vec::new(),
            AnyColumnData::List(c) => vec![c.child.as_ref()],
            AnyColumnData::Struct(c) => c.children.iter().collect(),
            AnyColumnData::Array(c) => vec![c.child.as_ref()],
        };
        for (i, child) in children.into_iter().enumerate() {
            let mut child_path = col_path.to_vec();
            child_path.push(i);
            result.extend(child.get_column_segment_info(row_group_index, &child_path));
        }
        result
    }

    /// Releases persisted blocks across the column tree.
    pub fn commit_drop(&self) {
        match self {
            AnyColumnData::Standard(c) => c.data.commit_drop(),
            AnyColumnData::Validity(c) => c.data.commit_drop(),
            AnyColumnData::List(c) => {
                c.offsets.commit_drop();
                c.validity.data.commit_drop();
                c.child.commit_drop();
            }
            AnyColumnData::Struct(c) => {
                c.validity.data.commit_drop();
                for child in &c.children {
                    child.commit_drop();
                }
            }
            AnyColumnData::Array(c) => {
                c.validity.data.commit_drop();
                c.child.commit_drop();
            }
        }
    }

    /// Structural invariant check across the tree (debug builds).
    pub fn verify(&self) {
        match self {
            AnyColumnData::Standard(c) => c.data.verify(),
            AnyColumnData::Validity(c) => c.data.verify(),
            AnyColumnData::List(c) => {
                c.offsets.verify();
                c.validity.data.verify();
                c.child.verify();
            }
            AnyColumnData::Struct(c) => {
                c.validity.data.verify();
                for child in &c.children {
                    child.verify();
                }
            }
            AnyColumnData::Array(c) => {
                c.validity.data.verify();
                c.child.verify();
            }
        }
    }
}
