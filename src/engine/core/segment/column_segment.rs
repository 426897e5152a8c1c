use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::compression::{CompressionCodec, CompressionMethod};
use crate::engine::core::block::BlockPointer;
use crate::engine::core::stats::{ColumnStats, ZoneFilter};
use crate::engine::core::vector::{
    LogicalType, RowId, SelectionVector, UnifiedFormat, ValidityMask, Value, ValueBuffer,
    ValueVector, VectorSource,
};
use crate::engine::errors::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Still accepting appends, not yet checkpointed.
    Transient,
    /// Immutable, durably written at checkpoint.
    Persistent,
}

/// Decoded row storage of one segment; also its persisted form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPayload {
    pub buffer: ValueBuffer,
    pub validity: ValidityMask,
}

/// Per-segment scan cursor. Holds only an offset so paused scans survive
/// directory mutation; pushed onto the resume stack at segment boundaries.
#[derive(Debug, Clone, Default)]
pub struct SegmentScanState {
    pub row_offset: usize,
}

/// Per-segment append cursor.
#[derive(Debug, Clone, Default)]
pub struct SegmentAppendState {
    pub rows_written: usize,
}

/// One physical storage unit covering a contiguous row range of a column.
///
/// `count` is published with release ordering only after the row data is in
/// place, so concurrent readers may observe a stale count but never a
/// phantom row.
pub struct ColumnSegment {
    start: AtomicU64,
    count: AtomicU64,
    kind: SegmentKind,
    ty: LogicalType,
    method: CompressionMethod,
    capacity: usize,
    data: RwLock<SegmentPayload>,
    stats: Mutex<ColumnStats>,
    block: Option<BlockPointer>,
}

impl std::fmt::Debug for ColumnSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnSegment")
            .field("start", &self.start())
            .field("count", &self.count())
            .field("kind", &self.kind)
            .field("method", &self.method)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl ColumnSegment {
    pub fn new_transient(ty: LogicalType, start: RowId, capacity_rows: usize) -> Self {
        debug_assert!(capacity_rows > 0);
        let buffer = ValueBuffer::for_type(&ty);
        trace!(
            target: "kolomdb::segment",
            start,
            capacity_rows,
            "Created transient segment"
        );
        Self {
            start: AtomicU64::new(start),
            count: AtomicU64::new(0),
            kind: SegmentKind::Transient,
            ty,
            method: CompressionMethod::None,
            capacity: capacity_rows,
            data: RwLock::new(SegmentPayload {
                buffer,
                validity: ValidityMask::new(),
            }),
            stats: Mutex::new(ColumnStats::new()),
            block: None,
        }
    }

    pub fn new_persistent(
        ty: LogicalType,
        start: RowId,
        method: CompressionMethod,
        stats: ColumnStats,
        block: BlockPointer,
        payload: SegmentPayload,
    ) -> Self {
        let count = payload.buffer.len() as u64;
        Self {
            start: AtomicU64::new(start),
            count: AtomicU64::new(count),
            kind: SegmentKind::Persistent,
            ty,
            method,
            capacity: payload.buffer.len(),
            data: RwLock::new(payload),
            stats: Mutex::new(stats),
            block: Some(block),
        }
    }

    pub fn start(&self) -> RowId {
        self.start.load(Ordering::Acquire)
    }

    /// Re-bases the segment after a row-group move. The caller serializes
    /// this with scans.
    pub fn set_start(&self, new_start: RowId) {
        self.start.store(new_start, Ordering::Release);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub fn end(&self) -> RowId {
        self.start() + self.count()
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn is_persistent(&self) -> bool {
        self.kind == SegmentKind::Persistent
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.ty
    }

    pub fn compression_method(&self) -> CompressionMethod {
        self.method
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn block_pointer(&self) -> Option<BlockPointer> {
        self.block
    }

    pub fn stats(&self) -> ColumnStats {
        self.stats.lock().expect("segment stats lock poisoned").clone()
    }

    pub fn initialize_scan(&self) -> SegmentScanState {
        SegmentScanState::default()
    }

    pub fn initialize_append(&self, state: &mut SegmentAppendState) {
        state.rows_written = 0;
    }

    /// Absorbs up to `count` rows starting at `offset` within `unified`.
    /// Returns how many were copied; fewer than requested means the segment
    /// is full and the caller must continue in a fresh one. The appended
    /// delta is merged into both the segment statistics and `append_stats`.
    pub fn append(
        &self,
        state: &mut SegmentAppendState,
        unified: &UnifiedFormat<'_>,
        offset: usize,
        count: usize,
        append_stats: &mut ColumnStats,
    ) -> Result<usize, StorageError> {
        if self.kind != SegmentKind::Transient || !self.method.supports_append() {
            return Err(StorageError::Internal(
                "append on a segment that does not accept appends".to_string(),
            ));
        }
        let mut delta = ColumnStats::new();
        let copied = {
            let mut data = self.data.write().expect("segment data lock poisoned");
            let available = self.capacity.saturating_sub(data.buffer.len());
            let copied = count.min(available);
            for i in 0..copied {
                let value = unified.value(offset + i);
                data.validity.push(!value.is_null());
                delta.update(&value);
                data.buffer.push_value(&value);
            }
            self.count.store(data.buffer.len() as u64, Ordering::Release);
            copied
        };
        state.rows_written += copied;
        {
            let mut stats = self.stats.lock().expect("segment stats lock poisoned");
            stats.merge(&delta);
        }
        append_stats.merge(&delta);
        trace!(
            target: "kolomdb::segment",
            start = self.start(),
            copied,
            requested = count,
            "Appended rows to segment"
        );
        Ok(copied)
    }

    /// Bulk scan of `scan_count` rows from the cursor into `result` at
    /// `result_offset`. With `entire_vector` set (whole output from this
    /// segment, no pending updates) the result becomes a zero-copy view
    /// over the segment's buffer instead of a materialized copy.
    pub fn scan(
        self: &Arc<Self>,
        state: &mut SegmentScanState,
        scan_count: usize,
        result: &mut ValueVector,
        result_offset: usize,
        entire_vector: bool,
    ) {
        debug_assert!(state.row_offset + scan_count <= self.count() as usize);
        if entire_vector {
            debug_assert_eq!(result_offset, 0);
            let source: Arc<dyn VectorSource> = self.clone();
            *result = ValueVector::reference(self.ty.clone(), source, state.row_offset, scan_count);
        } else {
            if result_offset == 0 {
                result.clear();
            }
            debug_assert_eq!(result.len(), result_offset);
            let data = self.data.read().expect("segment data lock poisoned");
            for i in 0..scan_count {
                let row = state.row_offset + i;
                if data.validity.is_valid(row) {
                    result.push(data.buffer.value_at(row));
                } else {
                    result.push(Value::Null);
                }
            }
        }
        state.row_offset += scan_count;
    }

    /// Copies the single row `row_id` into `result[result_idx]`.
    pub fn fetch_row(&self, row_id: RowId, result: &mut ValueVector, result_idx: usize) {
        debug_assert!(row_id >= self.start() && row_id < self.end());
        let row = (row_id - self.start()) as usize;
        let data = self.data.read().expect("segment data lock poisoned");
        let value = if data.validity.is_valid(row) {
            data.buffer.value_at(row)
        } else {
            Value::Null
        };
        result.resize(result_idx + 1);
        result.set(result_idx, value);
    }

    /// Advances the cursor without materializing values.
    pub fn skip(&self, state: &mut SegmentScanState, count: usize) {
        state.row_offset += count;
    }

    /// Rolls the append cursor back so the segment ends at `start_row`.
    pub fn revert_append(&self, start_row: RowId) -> Result<(), StorageError> {
        if self.kind != SegmentKind::Transient {
            return Err(StorageError::Internal(
                "revert_append on a persistent segment".to_string(),
            ));
        }
        debug_assert!(start_row >= self.start());
        let new_count = (start_row - self.start()) as usize;
        let mut data = self.data.write().expect("segment data lock poisoned");
        data.buffer.truncate(new_count);
        data.validity.truncate(new_count);
        self.count.store(new_count as u64, Ordering::Release);
        debug!(
            target: "kolomdb::segment",
            start = self.start(),
            new_count,
            "Reverted segment append"
        );
        Ok(())
    }

    /// Evaluates a pushed-down predicate over `count` scanned rows,
    /// producing the selection of matching positions.
    pub fn filter_selection(
        vector: &ValueVector,
        count: usize,
        filter: &ZoneFilter,
    ) -> SelectionVector {
        let mut sel = SelectionVector::new();
        for row in 0..count {
            if filter.matches_value(&vector.get(row)) {
                sel.push(row);
            }
        }
        sel
    }

    /// Snapshot of the decoded rows, used when checkpoint re-encodes the
    /// segment.
    pub fn payload(&self) -> SegmentPayload {
        self.data.read().expect("segment data lock poisoned").clone()
    }

    pub fn encode(&self, codec: &dyn CompressionCodec) -> Result<Vec<u8>, StorageError> {
        let payload = self.payload();
        let serialized = bincode::serialize(&payload)?;
        codec.compress(&serialized)
    }

    pub fn decode_payload(
        bytes: &[u8],
        codec: &dyn CompressionCodec,
    ) -> Result<SegmentPayload, StorageError> {
        let serialized = codec.decompress(bytes, 0)?;
        let payload: SegmentPayload = bincode::deserialize(&serialized)?;
        Ok(payload)
    }
}

impl VectorSource for ColumnSegment {
    fn source_value(&self, row: usize) -> Value {
        let data = self.data.read().expect("segment data lock poisoned");
        data.buffer.value_at(row)
    }

    fn source_is_valid(&self, row: usize) -> bool {
        let data = self.data.read().expect("segment data lock poisoned");
        data.validity.is_valid(row)
    }
}
