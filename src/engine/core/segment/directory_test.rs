use std::sync::Arc;

use crate::engine::core::segment::{ColumnSegment, SegmentAppendState, SegmentDirectory};
use crate::engine::core::stats::ColumnStats;
use crate::engine::core::vector::{LogicalType, Value, ValueVector};

fn filled_segment(start: u64, values: &[i64]) -> Arc<ColumnSegment> {
    let segment = ColumnSegment::new_transient(LogicalType::BigInt, start, values.len().max(1));
    let vector = ValueVector::from_values(
        LogicalType::BigInt,
        values.iter().map(|v| Value::BigInt(*v)).collect(),
    );
    let mut state = SegmentAppendState::default();
    segment.initialize_append(&mut state);
    let unified = vector.to_unified(None);
    let mut stats = ColumnStats::new();
    segment
        .append(&mut state, &unified, 0, values.len(), &mut stats)
        .unwrap();
    Arc::new(segment)
}

fn directory_of_three() -> SegmentDirectory {
    let directory = SegmentDirectory::new();
    directory.append_segment(filled_segment(0, &[1, 2, 3]));
    directory.append_segment(filled_segment(3, &[4, 5]));
    directory.append_segment(filled_segment(5, &[6, 7, 8, 9]));
    directory
}

#[test]
fn test_segment_containing_finds_owner() {
    let directory = directory_of_three();

    let (index, segment) = directory.segment_containing(0).unwrap();
    assert_eq!(index, 0);
    assert_eq!(segment.start(), 0);

    let (index, segment) = directory.segment_containing(4).unwrap();
    assert_eq!(index, 1);
    assert_eq!(segment.start(), 3);

    let (index, _) = directory.segment_containing(8).unwrap();
    assert_eq!(index, 2);

    assert!(directory.segment_containing(9).is_none());
}

#[test]
fn test_coverage_is_contiguous() {
    let directory = directory_of_three();
    let segments = directory.snapshot();
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end(), pair[1].start());
    }
    assert_eq!(directory.total_rows(), 9);
}

#[test]
fn test_erase_after_drops_tail_only() {
    let directory = directory_of_three();
    let removed = directory.erase_after(0);
    assert_eq!(removed.len(), 2);
    assert_eq!(directory.len(), 1);
    assert_eq!(directory.total_rows(), 3);

    // erasing after the last index is a no-op
    let removed = directory.erase_after(0);
    assert!(removed.is_empty());
}

#[test]
fn test_move_and_replace_swap_atomically() {
    let directory = directory_of_three();
    let moved = directory.move_segments();
    assert_eq!(moved.len(), 3);
    assert!(directory.is_empty());

    directory.replace(vec![filled_segment(0, &[1, 2, 3, 4, 5])]);
    assert_eq!(directory.len(), 1);
    assert_eq!(directory.total_rows(), 5);
}

#[test]
fn test_paused_cursor_survives_erase() {
    // a scan holding an index and an Arc keeps reading its segment even
    // after the directory drops it
    let directory = directory_of_three();
    let (_, segment) = directory.segment_containing(4).unwrap();
    directory.erase_after(0);

    let mut result = ValueVector::new(LogicalType::BigInt);
    segment.fetch_row(4, &mut result, 0);
    assert_eq!(result.get(0), Value::BigInt(5));
}
