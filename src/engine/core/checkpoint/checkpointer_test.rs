use std::sync::Arc;

use tempfile::tempdir;

use crate::engine::core::block::{BlockManager, FileBlockManager};
use crate::engine::core::checkpoint::{CheckpointInfo, Checkpointer};
use crate::engine::core::segment::{
    ColumnSegment, CompressionMethod, SegmentAppendState, codec_for,
};
use crate::engine::core::stats::ColumnStats;
use crate::engine::core::storage_config::StorageConfig;
use crate::engine::core::update::{TRANSACTION_ID_START, TransactionData, UpdateOverlay};
use crate::engine::core::vector::{LogicalType, Value, ValueVector};

fn small_config() -> StorageConfig {
    StorageConfig {
        vector_size: 4,
        block_size: 64, // 8 bigint rows per segment
        streaming_segment_rows: 8,
        checkpoint_compression: CompressionMethod::Lz4,
    }
}

fn transient_segment(start: u64, values: &[i64]) -> Arc<ColumnSegment> {
    let segment = ColumnSegment::new_transient(LogicalType::BigInt, start, values.len().max(1));
    let vector = ValueVector::from_values(
        LogicalType::BigInt,
        values.iter().map(|v| Value::BigInt(*v)).collect(),
    );
    let mut state = SegmentAppendState::default();
    segment.initialize_append(&mut state);
    let mut stats = ColumnStats::new();
    let unified = vector.to_unified(None);
    segment
        .append(&mut state, &unified, 0, values.len(), &mut stats)
        .unwrap();
    Arc::new(segment)
}

#[test]
fn test_checkpoint_rewrites_transient_segments() {
    let tmp = tempdir().unwrap();
    let blocks = FileBlockManager::create(tmp.path(), 64).unwrap();
    let config = small_config();
    let ty = LogicalType::BigInt;
    let checkpointer = Checkpointer::new(0, &ty, &config, &blocks, CheckpointInfo::default());

    let segments = vec![transient_segment(0, &[1, 2, 3]), transient_segment(3, &[4, 5])];
    let (new_segments, result) = checkpointer.checkpoint(segments, None).unwrap();

    assert_eq!(new_segments.len(), 2);
    assert!(new_segments.iter().all(|s| s.is_persistent()));
    assert_eq!(result.data_pointers.len(), 2);
    assert_eq!(result.data_pointers[0].row_start, 0);
    assert_eq!(result.data_pointers[0].row_count, 3);
    assert_eq!(result.data_pointers[1].row_start, 3);
    assert_eq!(result.stats.min, Some(Value::BigInt(1)));
    assert_eq!(result.stats.max, Some(Value::BigInt(5)));

    // the written blocks decode back to the same rows
    let pointer = &result.data_pointers[0];
    let bytes = blocks.read_block(&pointer.block).unwrap();
    let payload =
        ColumnSegment::decode_payload(&bytes, codec_for(pointer.compression)).unwrap();
    assert_eq!(payload.buffer.value_at(2), Value::BigInt(3));
}

#[test]
fn test_checkpoint_folds_committed_updates() {
    let tmp = tempdir().unwrap();
    let blocks = FileBlockManager::create(tmp.path(), 64).unwrap();
    let config = small_config();
    let ty = LogicalType::BigInt;
    let checkpointer = Checkpointer::new(0, &ty, &config, &blocks, CheckpointInfo::default());

    let mut overlay = UpdateOverlay::new(0, config.vector_size);
    let writer = TransactionData::new(TRANSACTION_ID_START + 1, 5);
    overlay
        .update(
            writer,
            &[1],
            &ValueVector::from_values(LogicalType::BigInt, vec![Value::BigInt(99)]),
            &[Value::BigInt(2)],
        )
        .unwrap();
    overlay.commit(writer.transaction_id, 6);

    let segments = vec![transient_segment(0, &[1, 2, 3])];
    let (new_segments, result) = checkpointer.checkpoint(segments, Some(&overlay)).unwrap();

    assert_eq!(new_segments.len(), 1);
    let mut state = new_segments[0].initialize_scan();
    let mut scanned = ValueVector::new(LogicalType::BigInt);
    new_segments[0].scan(&mut state, 3, &mut scanned, 0, false);
    assert_eq!(scanned.get(1), Value::BigInt(99));
    assert_eq!(result.stats.max, Some(Value::BigInt(99)));
}

#[test]
fn test_checkpoint_keeps_untouched_persistent_segments() {
    let tmp = tempdir().unwrap();
    let blocks = FileBlockManager::create(tmp.path(), 64).unwrap();
    let config = small_config();
    let ty = LogicalType::BigInt;
    let checkpointer = Checkpointer::new(0, &ty, &config, &blocks, CheckpointInfo::default());

    // first checkpoint persists the rows
    let (persisted, first) = checkpointer
        .checkpoint(vec![transient_segment(0, &[7, 8])], None)
        .unwrap();
    let original_block = first.data_pointers[0].block;

    // second checkpoint finds nothing to rewrite and reuses the block
    let (kept, second) = checkpointer.checkpoint(persisted, None).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(second.data_pointers[0].block, original_block);
}

#[test]
fn test_force_rewrite_allocates_new_blocks() {
    let tmp = tempdir().unwrap();
    let blocks = FileBlockManager::create(tmp.path(), 64).unwrap();
    let config = small_config();
    let ty = LogicalType::BigInt;

    let default_cp = Checkpointer::new(0, &ty, &config, &blocks, CheckpointInfo::default());
    let (persisted, first) = default_cp
        .checkpoint(vec![transient_segment(0, &[7, 8])], None)
        .unwrap();

    let forced = Checkpointer::new(
        0,
        &ty,
        &config,
        &blocks,
        CheckpointInfo {
            force_rewrite: true,
            compression: Some(CompressionMethod::None),
        },
    );
    let (rewritten, second) = forced.checkpoint(persisted, None).unwrap();
    assert_ne!(second.data_pointers[0].block, first.data_pointers[0].block);
    assert_eq!(
        second.data_pointers[0].compression,
        CompressionMethod::None
    );
    assert_eq!(rewritten.len(), 1);
}

#[test]
fn test_large_segment_splits_at_block_capacity() {
    let tmp = tempdir().unwrap();
    let blocks = FileBlockManager::create(tmp.path(), 64).unwrap();
    let config = small_config(); // 8 rows per block for bigint
    let ty = LogicalType::BigInt;
    let checkpointer = Checkpointer::new(0, &ty, &config, &blocks, CheckpointInfo::default());

    let values: Vec<i64> = (0..20).collect();
    let segments = vec![transient_segment(0, &values)];
    let (new_segments, result) = checkpointer.checkpoint(segments, None).unwrap();

    assert_eq!(new_segments.len(), 3); // 8 + 8 + 4
    assert_eq!(result.data_pointers[0].row_count, 8);
    assert_eq!(result.data_pointers[2].row_count, 4);
    assert_eq!(result.data_pointers[2].row_start, 16);
}

#[test]
fn test_empty_segment_list_produces_empty_result() {
    let tmp = tempdir().unwrap();
    let blocks = FileBlockManager::create(tmp.path(), 64).unwrap();
    let config = small_config();
    let ty = LogicalType::BigInt;
    let checkpointer = Checkpointer::new(0, &ty, &config, &blocks, CheckpointInfo::default());

    let (new_segments, result) = checkpointer.checkpoint(Vec::new(), None).unwrap();
    assert!(new_segments.is_empty());
    assert!(result.data_pointers.is_empty());
    assert_eq!(result.stats, ColumnStats::new());
}
