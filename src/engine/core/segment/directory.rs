use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use super::column_segment::ColumnSegment;
use crate::engine::core::vector::RowId;

/// Ordered collection of a column's segments over disjoint, contiguous row
/// ranges.
///
/// Structure-changing operations (append, erase, replace) take the write
/// lock; lookups take the read lock only for the duration of the call, so a
/// long scan never blocks appends to segments it is not visiting. Cursors
/// address segments by index, never by reference — the directory owns every
/// segment through an `Arc`, so a paused scan keeps its current segment
/// alive even across a concurrent revert.
#[derive(Debug, Default)]
pub struct SegmentDirectory {
    segments: RwLock<Vec<Arc<ColumnSegment>>>,
}

impl SegmentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.segments.read().expect("directory lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Arc<ColumnSegment>> {
        self.segments
            .read()
            .expect("directory lock poisoned")
            .get(index)
            .cloned()
    }

    pub fn first(&self) -> Option<Arc<ColumnSegment>> {
        self.get(0)
    }

    pub fn last(&self) -> Option<(usize, Arc<ColumnSegment>)> {
        let segments = self.segments.read().expect("directory lock poisoned");
        let index = segments.len().checked_sub(1)?;
        Some((index, Arc::clone(&segments[index])))
    }

    /// Index of the segment whose row range contains `row`.
    pub fn segment_index_of(&self, row: RowId) -> Option<usize> {
        let segments = self.segments.read().expect("directory lock poisoned");
        let index = segments.partition_point(|segment| segment.end() <= row);
        if index < segments.len() && segments[index].start() <= row {
            Some(index)
        } else {
            None
        }
    }

    pub fn segment_containing(&self, row: RowId) -> Option<(usize, Arc<ColumnSegment>)> {
        let segments = self.segments.read().expect("directory lock poisoned");
        let index = segments.partition_point(|segment| segment.end() <= row);
        if index < segments.len() && segments[index].start() <= row {
            Some((index, Arc::clone(&segments[index])))
        } else {
            None
        }
    }

    pub fn append_segment(&self, segment: Arc<ColumnSegment>) {
        let mut segments = self.segments.write().expect("directory lock poisoned");
        if let Some(last) = segments.last() {
            debug_assert_eq!(last.end(), segment.start(), "segment coverage gap");
        }
        trace!(
            target: "kolomdb::directory",
            start = segment.start(),
            index = segments.len(),
            "Appended segment"
        );
        segments.push(segment);
    }

    /// Removes every segment after `index`, returning the removed tail.
    pub fn erase_after(&self, index: usize) -> Vec<Arc<ColumnSegment>> {
        let mut segments = self.segments.write().expect("directory lock poisoned");
        if index + 1 >= segments.len() {
            return Vec::new();
        }
        let removed = segments.split_off(index + 1);
        debug!(
            target: "kolomdb::directory",
            kept = segments.len(),
            removed = removed.len(),
            "Erased trailing segments"
        );
        removed
    }

    /// Moves the whole segment list out, leaving the directory empty. Used
    /// by checkpoint before compaction.
    pub fn move_segments(&self) -> Vec<Arc<ColumnSegment>> {
        let mut segments = self.segments.write().expect("directory lock poisoned");
        std::mem::take(&mut *segments)
    }

    /// Atomically installs a new segment list, superseding the current one.
    pub fn replace(&self, new_segments: Vec<Arc<ColumnSegment>>) {
        let mut segments = self.segments.write().expect("directory lock poisoned");
        debug!(
            target: "kolomdb::directory",
            old = segments.len(),
            new = new_segments.len(),
            "Replaced segment list"
        );
        *segments = new_segments;
    }

    /// Consistent snapshot of the current list, for diagnostics and
    /// verification.
    pub fn snapshot(&self) -> Vec<Arc<ColumnSegment>> {
        self.segments
            .read()
            .expect("directory lock poisoned")
            .clone()
    }

    /// Sum of rows across all segments.
    pub fn total_rows(&self) -> u64 {
        self.segments
            .read()
            .expect("directory lock poisoned")
            .iter()
            .map(|segment| segment.count())
            .sum()
    }
}
