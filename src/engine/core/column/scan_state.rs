use crate::engine::core::segment::{SegmentAppendState, SegmentScanState};
use crate::engine::core::update::TransactionData;
use crate::engine::core::vector::RowId;

/// Caller-tunable scan behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Forces per-row fetch semantics instead of bulk decoding; needed when
    /// a filter or index build requires random access.
    pub force_fetch_row: bool,
}

/// Visibility mode of a scan. One enum instead of compile-time variants.
#[derive(Debug, Clone, Copy)]
pub enum ScanMode {
    /// Applies uncommitted overlay entries visible to the transaction.
    Transactional(TransactionData),
    /// Committed-only view, for checkpoint and index builds. With
    /// `allow_updates` unset, uncommitted updates in the scanned block are
    /// a conflict.
    Committed { allow_updates: bool },
}

/// Cursor into a column's segment directory. Transient and caller-owned;
/// rebuilt per scan. Holds directory indices, never segment references.
#[derive(Debug, Default)]
pub struct ColumnScanState {
    /// Directory index of the segment being scanned.
    pub current: Option<usize>,
    /// Absolute row index the scan will read next.
    pub row_index: RowId,
    /// Absolute position of the segment-internal cursor.
    pub internal_index: RowId,
    pub initialized: bool,
    pub segment_state: SegmentScanState,
    /// Cursors of segments already visited by this scan, pushed when a
    /// single logical scan crosses a segment boundary.
    pub previous_states: Vec<SegmentScanState>,
    pub scan_options: ScanOptions,
    /// Child cursors for nested column variants.
    pub child_states: Vec<ColumnScanState>,
}

impl ColumnScanState {
    /// Advances the logical position without materializing rows; the next
    /// scan call skips the segment cursor forward to match.
    pub fn next(&mut self, count: usize) {
        self.row_index += count as RowId;
    }
}

/// Append cursor: the segment currently absorbing rows plus its
/// segment-local state.
#[derive(Debug, Default)]
pub struct ColumnAppendState {
    pub current: Option<usize>,
    pub segment_state: SegmentAppendState,
    /// Child cursors for nested column variants.
    pub child_appends: Vec<ColumnAppendState>,
}

/// State for scattered point fetches.
#[derive(Debug, Default)]
pub struct ColumnFetchState {
    pub child_states: Vec<ColumnFetchState>,
}
