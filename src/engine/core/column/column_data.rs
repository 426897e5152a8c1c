use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use super::scan_state::{ColumnAppendState, ColumnFetchState, ColumnScanState, ScanMode};
use crate::engine::core::block::BlockManager;
use crate::engine::core::checkpoint::{
    CheckpointInfo, CheckpointResult, Checkpointer, DataPointer,
};
use crate::engine::core::segment::{ColumnSegment, SegmentDirectory, codec_for};
use crate::engine::core::stats::{ColumnStats, ZoneFilter};
use crate::engine::core::storage_config::StorageConfig;
use crate::engine::core::update::{TransactionData, UpdateOverlay};
use crate::engine::core::vector::{
    LogicalType, MAX_ROW_ID, RowId, SelectionVector, UnifiedFormat, Value, ValueVector,
};
use crate::engine::errors::{CheckpointError, StorageError};

/// Whether a column owns its statistics or is the child of a nested column
/// (the root ancestor owns them).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Root,
    Child,
}

/// Per-segment diagnostic record for administrative inspection.
#[derive(Debug, Clone)]
pub struct ColumnSegmentInfo {
    pub row_group_index: usize,
    pub column_id: usize,
    pub column_path: String,
    pub segment_idx: usize,
    pub segment_type: String,
    pub segment_start: RowId,
    pub segment_count: u64,
    pub compression_type: String,
    pub segment_stats: String,
    pub has_updates: bool,
    pub persistent: bool,
    pub block_id: Option<u64>,
    pub block_offset: Option<u64>,
}

/// Storage of one column for one row group: a segment directory plus a
/// lazily-created update overlay, bound to a logical type and a row range.
///
/// Lock order: the directory lock is never held while the overlay or
/// statistics lock is acquired. The overlay and statistics locks are never
/// held together.
pub struct ColumnData {
    start: AtomicU64,
    count: AtomicU64,
    column_index: usize,
    ty: LogicalType,
    role: ColumnRole,
    config: StorageConfig,
    block_manager: Arc<dyn BlockManager>,
    data: SegmentDirectory,
    stats: Option<Mutex<ColumnStats>>,
    updates: Mutex<Option<UpdateOverlay>>,
    allocation_size: AtomicU64,
}

impl std::fmt::Debug for ColumnData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnData")
            .field("start", &self.start())
            .field("count", &self.count())
            .field("column_index", &self.column_index)
            .field("type", &self.ty)
            .field("role", &self.role)
            .finish()
    }
}

impl ColumnData {
    pub fn new(
        block_manager: Arc<dyn BlockManager>,
        config: StorageConfig,
        column_index: usize,
        start: RowId,
        ty: LogicalType,
        role: ColumnRole,
    ) -> Result<Self, StorageError> {
        if ty.is_nested() {
            return Err(StorageError::Internal(format!(
                "nested type {} has no flat column storage",
                ty.name()
            )));
        }
        let stats = match role {
            ColumnRole::Root => Some(Mutex::new(ColumnStats::new())),
            ColumnRole::Child => None,
        };
        Ok(Self {
            start: AtomicU64::new(start),
            count: AtomicU64::new(0),
            column_index,
            ty,
            role,
            config,
            block_manager,
            data: SegmentDirectory::new(),
            stats,
            updates: Mutex::new(None),
            allocation_size: AtomicU64::new(0),
        })
    }

    pub fn start(&self) -> RowId {
        self.start.load(Ordering::Acquire)
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub fn get_max_entry(&self) -> u64 {
        self.count()
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.ty
    }

    pub fn column_index(&self) -> usize {
        self.column_index
    }

    pub fn role(&self) -> ColumnRole {
        self.role
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn allocation_size(&self) -> u64 {
        self.allocation_size.load(Ordering::Acquire)
    }

    pub fn segment_count(&self) -> usize {
        self.data.len()
    }

    /// Re-bases the column to a new start row after a row-group move,
    /// shifting every segment. The caller serializes this with scans.
    pub fn set_start(&self, new_start: RowId) {
        self.start.store(new_start, Ordering::Release);
        let mut offset = 0u64;
        for segment in self.data.snapshot() {
            segment.set_start(new_start + offset);
            offset += segment.count();
        }
    }

    // ------------------------------------------------------------------
    // update overlay integration
    // ------------------------------------------------------------------

    pub fn has_updates(&self) -> bool {
        let guard = self.updates.lock().expect("update lock poisoned");
        guard.is_some()
    }

    pub fn clear_updates(&self) {
        let mut guard = self.updates.lock().expect("update lock poisoned");
        *guard = None;
    }

    pub fn get_update_statistics(&self) -> Option<ColumnStats> {
        let guard = self.updates.lock().expect("update lock poisoned");
        guard.as_ref().map(|overlay| overlay.get_statistics())
    }

    /// Commits every pending overlay version of `transaction_id`.
    pub fn commit_updates(&self, transaction_id: u64, commit_id: u64) {
        let mut guard = self.updates.lock().expect("update lock poisoned");
        if let Some(overlay) = guard.as_mut() {
            overlay.commit(transaction_id, commit_id);
        }
    }

    /// Rolls back every pending overlay version of `transaction_id`.
    pub fn rollback_updates(&self, transaction_id: u64) {
        let mut guard = self.updates.lock().expect("update lock poisoned");
        if let Some(overlay) = guard.as_mut() {
            overlay.rollback(transaction_id);
        }
    }

    fn fetch_updates(
        &self,
        transaction: Option<&TransactionData>,
        vector_index: usize,
        result: &mut ValueVector,
        scan_count: usize,
        allow_updates: bool,
        scan_committed: bool,
    ) -> Result<(), StorageError> {
        let guard = self.updates.lock().expect("update lock poisoned");
        let Some(overlay) = guard.as_ref() else {
            return Ok(());
        };
        if !allow_updates && overlay.has_uncommitted(vector_index) {
            return Err(StorageError::TransactionConflict(
                "cannot create index with outstanding updates".to_string(),
            ));
        }
        result.flatten(scan_count);
        if scan_committed {
            overlay.fetch_updates(None, vector_index, result, scan_count);
        } else {
            overlay.fetch_updates(transaction, vector_index, result, scan_count);
        }
        Ok(())
    }

    fn fetch_update_row(
        &self,
        transaction: &TransactionData,
        row_id: RowId,
        result: &mut ValueVector,
        result_idx: usize,
    ) {
        let guard = self.updates.lock().expect("update lock poisoned");
        if let Some(overlay) = guard.as_ref() {
            let offset = (row_id - self.start()) as usize;
            overlay.fetch_row(transaction, offset, result, result_idx);
        }
    }

    /// Records a transactional overwrite of `row_ids` with the positionally
    /// matching rows of `update_vector`. The current values are fetched
    /// first so the overlay keeps undo images.
    pub fn update(
        &self,
        transaction: TransactionData,
        _column_index: usize,
        update_vector: &ValueVector,
        row_ids: &[RowId],
    ) -> Result<(), StorageError> {
        if row_ids.is_empty() {
            return Ok(());
        }
        let vector_size = self.config.vector_size as u64;

        // fetch pre-update values one vector block at a time
        let mut bases: Vec<Value> = Vec::with_capacity(row_ids.len());
        let mut block_cache: Option<(u64, ValueVector)> = None;
        for row_id in row_ids {
            let block = (*row_id - self.start()) / vector_size;
            let cached = match &block_cache {
                Some((cached_block, _)) if *cached_block == block => true,
                _ => false,
            };
            if !cached {
                let mut state = ColumnScanState::default();
                let mut base_vector = ValueVector::new(self.ty.clone());
                self.fetch(&mut state, *row_id, &mut base_vector)?;
                base_vector.flatten(self.config.vector_size);
                block_cache = Some((block, base_vector));
            }
            let (_, base_vector) = block_cache.as_ref().expect("base block fetched");
            let in_block = (*row_id - self.start()) % vector_size;
            bases.push(base_vector.get(in_block as usize));
        }

        self.update_internal(transaction, update_vector, row_ids, bases)
    }

    fn update_internal(
        &self,
        transaction: TransactionData,
        update_vector: &ValueVector,
        row_ids: &[RowId],
        bases: Vec<Value>,
    ) -> Result<(), StorageError> {
        {
            let mut guard = self.updates.lock().expect("update lock poisoned");
            let overlay = guard
                .get_or_insert_with(|| UpdateOverlay::new(self.start(), self.config.vector_size));
            overlay.update(transaction, row_ids, update_vector, &bases)?;
        }
        // widen the aggregate so zonemap pruning stays sound while the
        // update is pending; checkpoint recomputes exact bounds
        if let Some(stats) = &self.stats {
            let mut guard = stats.lock().expect("stats lock poisoned");
            for i in 0..row_ids.len() {
                guard.update(&update_vector.get(i));
            }
        }
        debug!(
            target: "kolomdb::column",
            column_index = self.column_index,
            rows = row_ids.len(),
            "Recorded column update"
        );
        Ok(())
    }

    /// Recursive entry point for nested updates; terminal for a flat column.
    pub fn update_column(
        &self,
        transaction: TransactionData,
        column_path: &[usize],
        update_vector: &ValueVector,
        row_ids: &[RowId],
        depth: usize,
    ) -> Result<(), StorageError> {
        debug_assert!(depth >= column_path.len());
        let column_index = column_path.first().copied().unwrap_or(self.column_index);
        self.update(transaction, column_index, update_vector, row_ids)
    }

    // ------------------------------------------------------------------
    // scan protocol
    // ------------------------------------------------------------------

    pub fn initialize_scan(&self, state: &mut ColumnScanState) {
        state.current = if self.data.is_empty() { None } else { Some(0) };
        state.row_index = self
            .data
            .first()
            .map(|segment| segment.start())
            .unwrap_or(0);
        state.internal_index = state.row_index;
        state.initialized = false;
        state.segment_state = Default::default();
        state.previous_states.clear();
    }

    pub fn initialize_scan_with_offset(
        &self,
        state: &mut ColumnScanState,
        row_idx: RowId,
    ) -> Result<(), StorageError> {
        let (index, segment) = self.data.segment_containing(row_idx).ok_or_else(|| {
            StorageError::Internal(format!("row {} outside column storage", row_idx))
        })?;
        state.current = Some(index);
        state.row_index = row_idx;
        state.internal_index = segment.start();
        state.initialized = false;
        state.segment_state = Default::default();
        state.previous_states.clear();
        Ok(())
    }

    /// The cross-segment scan loop: pulls up to `remaining` rows starting at
    /// `state.row_index` into `result`, walking segments through the
    /// directory and pushing per-segment cursors onto the resume stack at
    /// each boundary. Returns the rows actually produced; fewer than
    /// requested means end of column.
    pub fn scan_vector(
        &self,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
        remaining: usize,
        has_updates: bool,
    ) -> usize {
        state.previous_states.clear();
        let Some(mut current_idx) = state.current else {
            return 0;
        };
        let Some(mut segment) = self.data.get(current_idx) else {
            return 0;
        };
        if !state.initialized {
            state.segment_state = segment.initialize_scan();
            state.internal_index = segment.start();
            state.initialized = true;
        }

        // a seek may have moved the logical position past whole segments
        while state.row_index >= segment.end() {
            let next_idx = current_idx + 1;
            match self.data.get(next_idx) {
                Some(next) => {
                    current_idx = next_idx;
                    segment = next;
                    state.segment_state = segment.initialize_scan();
                    state.internal_index = segment.start();
                }
                None => {
                    state.current = Some(current_idx);
                    return 0;
                }
            }
        }
        debug_assert!(state.internal_index <= state.row_index);
        if state.internal_index < state.row_index {
            let skip = (state.row_index - state.internal_index) as usize;
            segment.skip(&mut state.segment_state, skip);
            state.internal_index = state.row_index;
        }

        let initial_remaining = remaining;
        let mut remaining = remaining;
        while remaining > 0 {
            debug_assert!(
                state.row_index >= segment.start() && state.row_index <= segment.end()
            );
            let scan_count = remaining.min((segment.end() - state.row_index) as usize);
            let result_offset = initial_remaining - remaining;
            if scan_count > 0 {
                if state.scan_options.force_fetch_row {
                    if result_offset == 0 {
                        result.clear();
                    }
                    for i in 0..scan_count {
                        segment.fetch_row(
                            state.row_index + i as RowId,
                            result,
                            result_offset + i,
                        );
                    }
                    segment.skip(&mut state.segment_state, scan_count);
                } else {
                    let entire_vector = !has_updates && scan_count == initial_remaining;
                    segment.scan(
                        &mut state.segment_state,
                        scan_count,
                        result,
                        result_offset,
                        entire_vector,
                    );
                }
                state.row_index += scan_count as RowId;
                remaining -= scan_count;
            }

            if remaining > 0 {
                let next_idx = current_idx + 1;
                let Some(next) = self.data.get(next_idx) else {
                    // end of column: partial scan
                    break;
                };
                state
                    .previous_states
                    .push(std::mem::take(&mut state.segment_state));
                current_idx = next_idx;
                segment = next;
                state.segment_state = segment.initialize_scan();
                debug_assert!(
                    state.row_index >= segment.start() && state.row_index <= segment.end()
                );
            }
        }
        state.current = Some(current_idx);
        state.internal_index = state.row_index;
        initial_remaining - remaining
    }

    /// Single scan entry point over the visibility modes.
    pub fn scan_mode(
        &self,
        mode: ScanMode,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
    ) -> Result<usize, StorageError> {
        let current_row = vector_index as u64 * self.config.vector_size as u64;
        if current_row > self.count() {
            return Ok(0);
        }
        let vector_count = self
            .config
            .vector_size
            .min((self.count() - current_row) as usize);
        let scan_count = self.scan_vector(state, result, vector_count, self.has_updates());
        match mode {
            ScanMode::Transactional(transaction) => {
                self.fetch_updates(
                    Some(&transaction),
                    vector_index,
                    result,
                    scan_count,
                    true,
                    false,
                )?;
            }
            ScanMode::Committed { allow_updates } => {
                self.fetch_updates(None, vector_index, result, scan_count, allow_updates, true)?;
            }
        }
        Ok(scan_count)
    }

    /// Transactional scan of vector block `vector_index`.
    pub fn scan(
        &self,
        transaction: TransactionData,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
    ) -> Result<usize, StorageError> {
        self.scan_mode(ScanMode::Transactional(transaction), vector_index, state, result)
    }

    /// Committed-only scan, for checkpoints and index builds.
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

    /// Raw scan of up to `scan_count` rows. Only valid while no overlay
    /// exists; checkpoint staging consumes the overlay separately.
    pub fn scan_count(
        &self,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
        scan_count: usize,
    ) -> Result<usize, StorageError> {
        if scan_count == 0 {
            return Ok(0);
        }
        if self.has_updates() {
            return Err(StorageError::Internal(
                "raw scan on a column with pending updates".to_string(),
            ));
        }
        Ok(self.scan_vector(state, result, scan_count, false))
    }

    /// Seeks to `offset` rows past the column start and scans exactly
    /// `count` rows with committed updates folded in, regardless of vector
    /// alignment.
    pub fn scan_committed_range(
        &self,
        offset: u64,
        count: usize,
        result: &mut ValueVector,
    ) -> Result<usize, StorageError> {
        let mut child_state = ColumnScanState::default();
        self.initialize_scan_with_offset(&mut child_state, self.start() + offset)?;
        let has_updates = self.has_updates();
        let scan_count = self.scan_vector(&mut child_state, result, count, has_updates);
        if has_updates {
            result.flatten(scan_count);
            let guard = self.updates.lock().expect("update lock poisoned");
            if let Some(overlay) = guard.as_ref() {
                overlay.fetch_committed_range(offset as usize, scan_count, result);
            }
        }
        Ok(scan_count)
    }

    /// Transactional scan plus pushed-down filter: scans one vector block,
    /// then narrows `sel` to the rows matching `filter`.
    pub fn select(
        &self,
        transaction: TransactionData,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
        sel: &mut SelectionVector,
        filter: &ZoneFilter,
    ) -> Result<usize, StorageError> {
        let scan_count = self.scan(transaction, vector_index, state, result)?;
        *sel = ColumnSegment::filter_selection(result, scan_count, filter);
        Ok(sel.len())
    }

    /// Transactional scan sliced by a previously computed selection.
    pub fn filter_scan(
        &self,
        transaction: TransactionData,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
        sel: &SelectionVector,
        sel_count: usize,
    ) -> Result<usize, StorageError> {
        let scan_count = self.scan(transaction, vector_index, state, result)?;
        result.flatten(scan_count);
        result.slice(sel, sel_count);
        Ok(sel_count)
    }

    /// Committed scan sliced by a previously computed selection.
    pub fn filter_scan_committed(
        &self,
        vector_index: usize,
        state: &mut ColumnScanState,
        result: &mut ValueVector,
        sel: &SelectionVector,
        sel_count: usize,
        allow_updates: bool,
    ) -> Result<usize, StorageError> {
        let scan_count = self.scan_committed(vector_index, state, result, allow_updates)?;
        result.flatten(scan_count);
        result.slice(sel, sel_count);
        Ok(sel_count)
    }

    /// Advances a scan cursor without materializing rows.
    pub fn skip(&self, state: &mut ColumnScanState, count: usize) {
        state.next(count);
    }

    // ------------------------------------------------------------------
    // point access
    // ------------------------------------------------------------------

    /// Reads the whole vector-aligned block containing `row_id`, without
    /// overlay application. The read side of an update.
    pub fn fetch(
        &self,
        state: &mut ColumnScanState,
        row_id: RowId,
        result: &mut ValueVector,
    ) -> Result<usize, StorageError> {
        if row_id < self.start() {
            return Err(StorageError::Internal(format!(
                "fetch of row {} before column start {}",
                row_id,
                self.start()
            )));
        }
        let vector_size = self.config.vector_size as u64;
        state.row_index =
            self.start() + ((row_id - self.start()) / vector_size) * vector_size;
        let (index, segment) = self.data.segment_containing(state.row_index).ok_or_else(|| {
            StorageError::Internal(format!("row {} outside column storage", row_id))
        })?;
        state.current = Some(index);
        state.internal_index = segment.start();
        state.initialized = false;
        Ok(self.scan_vector(state, result, self.config.vector_size, false))
    }

    /// Reads a single row and merges the transaction-visible update on top.
    /// For scattered random access, e.g. row ids coming from an index.
    pub fn fetch_row(
        &self,
        transaction: TransactionData,
        _state: &mut ColumnFetchState,
        row_id: RowId,
        result: &mut ValueVector,
        result_idx: usize,
    ) -> Result<(), StorageError> {
        let (_, segment) = self.data.segment_containing(row_id).ok_or_else(|| {
            StorageError::Internal(format!("row {} outside column storage", row_id))
        })?;
        segment.fetch_row(row_id, result, result_idx);
        self.fetch_update_row(&transaction, row_id, result, result_idx);
        Ok(())
    }

    // ------------------------------------------------------------------
    // append protocol
    // ------------------------------------------------------------------

    /// Positions the append cursor: reuses the last transient segment when
    /// its strategy accepts appends, otherwise chains a fresh one.
    pub fn initialize_append(&self, state: &mut ColumnAppendState) -> Result<(), StorageError> {
        if self.data.is_empty() {
            self.append_transient_segment(self.start());
        }
        let (index, last) = self
            .data
            .last()
            .ok_or_else(|| StorageError::Internal("directory empty after init".to_string()))?;
        let (index, segment) =
            if last.is_persistent() || !last.compression_method().supports_append() {
                self.append_transient_segment(last.end());
                self.data.last().ok_or_else(|| {
                    StorageError::Internal("directory empty after append".to_string())
                })?
            } else {
                (index, last)
            };
        debug_assert!(!segment.is_persistent());
        state.current = Some(index);
        segment.initialize_append(&mut state.segment_state);
        Ok(())
    }

    /// Runs `f` under the column's own statistics lock. Only valid on a
    /// root column: a child column never owns statistics, so reaching this
    /// on one is a bug in the caller.
    pub fn with_own_stats<R>(
        &self,
        f: impl FnOnce(&mut ColumnStats) -> R,
    ) -> Result<R, StorageError> {
        if self.role == ColumnRole::Child {
            return Err(StorageError::Internal(
                "root statistics access on a child column".to_string(),
            ));
        }
        let Some(stats) = &self.stats else {
            return Err(StorageError::Internal(
                "statistics access on a column without statistics".to_string(),
            ));
        };
        let mut guard = stats.lock().expect("stats lock poisoned");
        Ok(f(&mut guard))
    }

    /// Appends through the column's own statistics. Only valid on a root
    /// column: calling this on a child column is a bug in the caller.
    pub fn append_with_own_stats(
        &self,
        state: &mut ColumnAppendState,
        vector: &ValueVector,
        count: usize,
    ) -> Result<(), StorageError> {
        self.with_own_stats(|stats| self.append(stats, state, vector, count))?
    }

    /// Appends `count` rows from `vector`, merging the appended delta into
    /// the caller-supplied aggregate.
    pub fn append(
        &self,
        stats: &mut ColumnStats,
        state: &mut ColumnAppendState,
        vector: &ValueVector,
        count: usize,
    ) -> Result<(), StorageError> {
        let unified = vector.to_unified(None);
        self.append_data(stats, state, &unified, count)
    }

    /// The append loop: the count is published first so concurrent readers
    /// may only be behind, never observe a phantom row; each full segment
    /// chains a fresh transient one.
    pub fn append_data(
        &self,
        stats: &mut ColumnStats,
        state: &mut ColumnAppendState,
        unified: &UnifiedFormat<'_>,
        count: usize,
    ) -> Result<(), StorageError> {
        let mut offset = 0usize;
        let mut remaining = count;
        self.count.fetch_add(count as u64, Ordering::Release);
        loop {
            let index = state.current.ok_or_else(|| {
                StorageError::Internal("append without initialized state".to_string())
            })?;
            let segment = self.data.get(index).ok_or_else(|| {
                StorageError::Internal("append cursor outside directory".to_string())
            })?;
            let copied =
                segment.append(&mut state.segment_state, unified, offset, remaining, stats)?;
            if copied == remaining {
                break;
            }
            // current segment is full: chain a new transient segment
            self.append_transient_segment(segment.end());
            let (new_index, new_segment) = self.data.last().ok_or_else(|| {
                StorageError::Internal("directory empty after append".to_string())
            })?;
            state.current = Some(new_index);
            new_segment.initialize_append(&mut state.segment_state);
            offset += copied;
            remaining -= copied;
        }
        trace!(
            target: "kolomdb::column",
            column_index = self.column_index,
            appended = count,
            count = self.count(),
            "Appended rows"
        );
        Ok(())
    }

    /// Chains a new transient segment. The segment size is bounded by the
    /// block size; the `MAX_ROW_ID` sentinel selects the streaming capacity
    /// policy instead.
    fn append_transient_segment(&self, start_row: RowId) {
        let type_size = self.ty.fixed_size().max(1);
        let vector_segment_size = if start_row == MAX_ROW_ID {
            self.config.streaming_segment_rows * type_size
        } else {
            self.config.block_size
        };
        let segment_size = self.config.block_size.min(vector_segment_size);
        self.allocation_size
            .fetch_add(segment_size as u64, Ordering::Release);
        let capacity_rows = (segment_size / type_size).max(1);
        self.data.append_segment(Arc::new(ColumnSegment::new_transient(
            self.ty.clone(),
            start_row,
            capacity_rows,
        )));
    }

    /// Rolls back a failed or aborted append. A `start_row` at or past the
    /// end of storage means nothing was appended: no-op.
    pub fn revert_append(&self, start_row: RowId) -> Result<(), StorageError> {
        let Some((_, last)) = self.data.last() else {
            return Ok(());
        };
        if start_row >= last.end() {
            debug_assert_eq!(start_row, last.end());
            return Ok(());
        }
        let index = self.data.segment_index_of(start_row).ok_or_else(|| {
            StorageError::Internal(format!("revert row {} outside storage", start_row))
        })?;
        let segment = self
            .data
            .get(index)
            .ok_or_else(|| StorageError::Internal("segment vanished during revert".to_string()))?;
        if segment.is_persistent() {
            return Err(StorageError::Internal(
                "revert_append targeting a persistent segment".to_string(),
            ));
        }
        self.data.erase_after(index);
        self.count
            .store(start_row - self.start(), Ordering::Release);
        segment.revert_append(start_row)?;
        debug!(
            target: "kolomdb::column",
            column_index = self.column_index,
            start_row,
            "Reverted append"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // statistics
    // ------------------------------------------------------------------

    fn stats_lock(&self) -> Result<std::sync::MutexGuard<'_, ColumnStats>, StorageError> {
        let Some(stats) = &self.stats else {
            return Err(StorageError::Internal(
                "statistics requested on a column without statistics".to_string(),
            ));
        };
        Ok(stats.lock().expect("stats lock poisoned"))
    }

    /// Zonemap check: false only when no row of this column can match
    /// `filter`, so pruning on a false result is always sound.
    pub fn check_zonemap(&self, filter: &ZoneFilter) -> Result<bool, StorageError> {
        let guard = self.stats_lock()?;
        Ok(filter.check_stats(&guard))
    }

    pub fn get_statistics(&self) -> Result<ColumnStats, StorageError> {
        Ok(self.stats_lock()?.clone())
    }

    pub fn merge_statistics(&self, other: &ColumnStats) -> Result<(), StorageError> {
        self.stats_lock()?.merge(other);
        Ok(())
    }

    pub fn merge_into_statistics(&self, target: &mut ColumnStats) -> Result<(), StorageError> {
        let guard = self.stats_lock()?;
        target.merge(&guard);
        Ok(())
    }

    // ------------------------------------------------------------------
    // checkpoint
    // ------------------------------------------------------------------

    /// Compacts the directory and pending committed updates into a new
    /// persistent segment list, clears the overlay, and returns the data
    /// pointers for the durable catalog entry. A never-appended column
    /// yields an empty result without writing anything.
    pub fn checkpoint(&self, info: CheckpointInfo) -> Result<CheckpointResult, CheckpointError> {
        let nodes = self.data.move_segments();
        if nodes.is_empty() {
            return Ok(CheckpointResult::default());
        }
        let checkpointer = Checkpointer::new(
            self.start(),
            &self.ty,
            &self.config,
            self.block_manager.as_ref(),
            info,
        );
        let outcome = {
            let guard = self.updates.lock().expect("update lock poisoned");
            checkpointer.checkpoint(nodes.clone(), guard.as_ref())
        };
        let (new_segments, result) = match outcome {
            Ok(produced) => produced,
            Err(e) => {
                // put the moved segments back so the column stays readable
                self.data.replace(nodes);
                return Err(e);
            }
        };
        self.data.replace(new_segments);
        self.clear_updates();
        if let Some(stats) = &self.stats {
            let mut guard = stats.lock().expect("stats lock poisoned");
            *guard = result.stats.clone();
        }
        Ok(result)
    }

    /// Rebuilds the directory from persisted data pointers, merging their
    /// statistics into `target_stats`.
    pub fn deserialize(
        &self,
        data_pointers: Vec<DataPointer>,
        target_stats: &mut ColumnStats,
    ) -> Result<(), StorageError> {
        self.count.store(0, Ordering::Release);
        for pointer in data_pointers {
            self.count.fetch_add(pointer.row_count, Ordering::Release);
            target_stats.merge(&pointer.stats);
            let bytes = self.block_manager.read_block(&pointer.block)?;
            let payload =
                ColumnSegment::decode_payload(&bytes, codec_for(pointer.compression))?;
            if payload.buffer.len() as u64 != pointer.row_count {
                return Err(StorageError::Corrupt(format!(
                    "block {} holds {} rows, data pointer claims {}",
                    pointer.block.block_id,
                    payload.buffer.len(),
                    pointer.row_count
                )));
            }
            let segment = ColumnSegment::new_persistent(
                self.ty.clone(),
                pointer.row_start,
                pointer.compression,
                pointer.stats,
                pointer.block,
                payload,
            );
            self.data.append_segment(Arc::new(segment));
        }
        Ok(())
    }

    /// Reconstructs a root column from its durable representation.
    pub fn deserialize_column(
        block_manager: Arc<dyn BlockManager>,
        config: StorageConfig,
        column_index: usize,
        start: RowId,
        ty: LogicalType,
        data_pointers: Vec<DataPointer>,
    ) -> Result<Self, StorageError> {
        let column = Self::new(block_manager, config, column_index, start, ty, ColumnRole::Root)?;
        let mut stats = ColumnStats::new();
        column.deserialize(data_pointers, &mut stats)?;
        if let Some(own) = &column.stats {
            *own.lock().expect("stats lock poisoned") = stats;
        }
        Ok(column)
    }

    /// Releases every persisted block when the column is dropped.
    pub fn commit_drop(&self) {
        for segment in self.data.snapshot() {
            if let Some(block) = segment.block_pointer() {
                self.block_manager.free_block(&block);
            }
        }
    }

    // ------------------------------------------------------------------
    // diagnostics
    // ------------------------------------------------------------------

    pub fn get_column_segment_info(
        &self,
        row_group_index: usize,
        col_path: &[usize],
    ) -> Vec<ColumnSegmentInfo> {
        debug_assert!(!col_path.is_empty());
        let path_str = format!(
            "[{}]",
            col_path
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let has_updates = self.has_updates();
        self.data
            .snapshot()
            .iter()
            .enumerate()
            .map(|(segment_idx, segment)| {
                let block = segment.block_pointer();
                ColumnSegmentInfo {
                    row_group_index,
                    column_id: col_path[0],
                    column_path: path_str.clone(),
                    segment_idx,
                    segment_type: self.ty.name(),
                    segment_start: segment.start(),
                    segment_count: segment.count(),
                    compression_type: segment.compression_method().as_str().to_string(),
                    segment_stats: segment.stats().summary(),
                    has_updates,
                    persistent: segment.is_persistent(),
                    block_id: block.map(|b| b.block_id),
                    block_offset: block.map(|b| b.offset),
                }
            })
            .collect()
    }

    /// Structural invariant check, compiled only into debug builds.
    pub fn verify(&self) {
        #[cfg(debug_assertions)]
        {
            let segments = self.data.snapshot();
            let mut current_start = self.start();
            let mut total_count = 0u64;
            for segment in &segments {
                assert_eq!(segment.start(), current_start);
                current_start += segment.count();
                total_count += segment.count();
            }
            assert_eq!(self.count(), total_count);
        }
    }
}
