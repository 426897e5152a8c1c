use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::transaction::{TRANSACTION_ID_START, TransactionData};
use crate::engine::core::stats::ColumnStats;
use crate::engine::core::vector::{RowId, Value, ValueVector};
use crate::engine::errors::StorageError;

#[derive(Debug, Clone)]
struct UpdateVersion {
    version_id: u64,
    value: Value,
}

#[derive(Debug, Clone)]
struct RowVersions {
    /// Pre-update value captured when the row was first touched; the undo
    /// image a rollback falls back to.
    base: Value,
    /// Versions in write order. Uncommitted entries carry the writing
    /// transaction's id, committed ones the commit id.
    versions: Vec<UpdateVersion>,
}

/// Sparse transactional patch structure over one column, keyed by
/// vector-aligned row blocks. Consulted after every raw segment scan;
/// cleared when a checkpoint bakes its deltas into new segments.
#[derive(Debug)]
pub struct UpdateOverlay {
    column_start: RowId,
    vector_size: usize,
    blocks: BTreeMap<usize, BTreeMap<usize, RowVersions>>,
    stats: ColumnStats,
}

impl UpdateOverlay {
    pub fn new(column_start: RowId, vector_size: usize) -> Self {
        Self {
            column_start,
            vector_size,
            blocks: BTreeMap::new(),
            stats: ColumnStats::new(),
        }
    }

    #[inline]
    fn block_of(&self, offset: usize) -> usize {
        offset / self.vector_size
    }

    /// Records one transactional overwrite per row id. `values` holds the
    /// new values positionally; `bases` the pre-update values fetched from
    /// storage, kept as the undo image.
    pub fn update(
        &mut self,
        transaction: TransactionData,
        row_ids: &[RowId],
        values: &ValueVector,
        bases: &[Value],
    ) -> Result<(), StorageError> {
        debug_assert_eq!(row_ids.len(), bases.len());
        for (i, row_id) in row_ids.iter().enumerate() {
            if *row_id < self.column_start {
                return Err(StorageError::Internal(format!(
                    "update row {} precedes column start {}",
                    row_id, self.column_start
                )));
            }
            let offset = (*row_id - self.column_start) as usize;
            let block = self.block_of(offset);
            let value = values.get(i);
            let entry = self
                .blocks
                .entry(block)
                .or_default()
                .entry(offset)
                .or_insert_with(|| RowVersions {
                    base: bases[i].clone(),
                    versions: Vec::new(),
                });
            if let Some(last) = entry.versions.last() {
                if last.version_id >= TRANSACTION_ID_START
                    && last.version_id != transaction.transaction_id
                {
                    return Err(StorageError::TransactionConflict(format!(
                        "row {} already updated by an uncommitted transaction",
                        row_id
                    )));
                }
            }
            self.stats.update(&value);
            entry.versions.push(UpdateVersion {
                version_id: transaction.transaction_id,
                value,
            });
        }
        trace!(
            target: "kolomdb::update",
            rows = row_ids.len(),
            transaction_id = transaction.transaction_id,
            "Recorded updates in overlay"
        );
        Ok(())
    }

    fn visible_value<'a>(
        versions: &'a RowVersions,
        transaction: Option<&TransactionData>,
    ) -> Option<&'a Value> {
        for version in versions.versions.iter().rev() {
            let visible = match transaction {
                Some(txn) => txn.can_see(version.version_id),
                None => version.version_id < TRANSACTION_ID_START,
            };
            if visible {
                return Some(&version.value);
            }
        }
        None
    }

    /// Patches `result` (rows of block `vector_index`) with the versions
    /// visible to `transaction`; `None` selects the committed-only view.
    pub fn fetch_updates(
        &self,
        transaction: Option<&TransactionData>,
        vector_index: usize,
        result: &mut ValueVector,
        count: usize,
    ) {
        let Some(rows) = self.blocks.get(&vector_index) else {
            return;
        };
        let block_start = vector_index * self.vector_size;
        for (offset, versions) in rows {
            let idx = offset - block_start;
            if idx >= count {
                continue;
            }
            if let Some(value) = Self::visible_value(versions, transaction) {
                result.set(idx, value.clone());
            }
        }
    }

    /// Patches an arbitrary contiguous row range with committed values,
    /// regardless of vector alignment. Used by the checkpointer.
    pub fn fetch_committed_range(
        &self,
        start_offset: usize,
        count: usize,
        result: &mut ValueVector,
    ) {
        let first_block = self.block_of(start_offset);
        let last_block = self.block_of(start_offset + count.saturating_sub(1));
        for (_, rows) in self.blocks.range(first_block..=last_block) {
            for (offset, versions) in rows {
                if *offset < start_offset || *offset >= start_offset + count {
                    continue;
                }
                if let Some(value) = Self::visible_value(versions, None) {
                    result.set(offset - start_offset, value.clone());
                }
            }
        }
    }

    /// Merges the visible update for one row into `result[result_idx]`, if
    /// any exists.
    pub fn fetch_row(
        &self,
        transaction: &TransactionData,
        row_offset: usize,
        result: &mut ValueVector,
        result_idx: usize,
    ) {
        let block = self.block_of(row_offset);
        if let Some(versions) = self.blocks.get(&block).and_then(|rows| rows.get(&row_offset)) {
            if let Some(value) = Self::visible_value(versions, Some(transaction)) {
                result.set(result_idx, value.clone());
            }
        }
    }

    pub fn has_uncommitted(&self, vector_index: usize) -> bool {
        self.blocks
            .get(&vector_index)
            .is_some_and(|rows| {
                rows.values().any(|versions| {
                    versions
                        .versions
                        .iter()
                        .any(|v| v.version_id >= TRANSACTION_ID_START)
                })
            })
    }

    /// True when any update (committed or not) touches `[start_offset,
    /// start_offset + count)`. Drives the checkpoint keep-vs-rewrite call.
    pub fn has_updates_in_range(&self, start_offset: usize, count: usize) -> bool {
        if count == 0 {
            return false;
        }
        let first_block = self.block_of(start_offset);
        let last_block = self.block_of(start_offset + count - 1);
        self.blocks.range(first_block..=last_block).any(|(_, rows)| {
            rows.keys()
                .any(|offset| *offset >= start_offset && *offset < start_offset + count)
        })
    }

    /// Rewrites every version of `transaction_id` to the commit id,
    /// making it visible to later snapshots.
    pub fn commit(&mut self, transaction_id: u64, commit_id: u64) {
        debug_assert!(transaction_id >= TRANSACTION_ID_START);
        debug_assert!(commit_id < TRANSACTION_ID_START);
        let mut committed = 0usize;
        for rows in self.blocks.values_mut() {
            for versions in rows.values_mut() {
                for version in versions.versions.iter_mut() {
                    if version.version_id == transaction_id {
                        version.version_id = commit_id;
                        committed += 1;
                    }
                }
            }
        }
        debug!(
            target: "kolomdb::update",
            transaction_id,
            commit_id,
            committed,
            "Committed overlay versions"
        );
    }

    /// Discards every uncommitted version of `transaction_id`; rows with no
    /// remaining versions drop out of the overlay entirely.
    pub fn rollback(&mut self, transaction_id: u64) {
        for rows in self.blocks.values_mut() {
            rows.retain(|_, versions| {
                versions
                    .versions
                    .retain(|v| v.version_id != transaction_id);
                !versions.versions.is_empty()
            });
        }
        self.blocks.retain(|_, rows| !rows.is_empty());
        debug!(target: "kolomdb::update", transaction_id, "Rolled back overlay versions");
    }

    /// Aggregate over every value ever written through the overlay; a
    /// widening supplement to the column statistics.
    pub fn get_statistics(&self) -> ColumnStats {
        self.stats.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Undo image for one row, if the row was updated.
    pub fn base_value(&self, row_offset: usize) -> Option<&Value> {
        let block = self.block_of(row_offset);
        self.blocks
            .get(&block)
            .and_then(|rows| rows.get(&row_offset))
            .map(|versions| &versions.base)
    }
}
