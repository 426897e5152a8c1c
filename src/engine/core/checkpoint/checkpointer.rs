use std::sync::Arc;

use tracing::{debug, info};

use super::data_pointer::DataPointer;
use crate::engine::core::block::BlockManager;
use crate::engine::core::segment::{
    ColumnSegment, CompressionMethod, SegmentPayload, codec_for,
};
use crate::engine::core::stats::ColumnStats;
use crate::engine::core::storage_config::StorageConfig;
use crate::engine::core::update::UpdateOverlay;
use crate::engine::core::vector::{
    LogicalType, RowId, ValidityMask, Value, ValueBuffer, ValueVector,
};
use crate::engine::errors::CheckpointError;

#[derive(Debug, Clone, Default)]
pub struct CheckpointInfo {
    /// Rewrite every segment even when the fast path would keep it.
    pub force_rewrite: bool,
    /// Overrides the configured codec for rewritten segments.
    pub compression: Option<CompressionMethod>,
}

#[derive(Debug, Default)]
pub struct CheckpointResult {
    pub data_pointers: Vec<DataPointer>,
    pub stats: ColumnStats,
}

/// Folds a column's segment list and pending committed updates into a new
/// immutable, persistent segment list.
///
/// Operates on segments already moved out of the directory, so no directory
/// lock is held while the overlay is consulted.
pub struct Checkpointer<'a> {
    column_start: RowId,
    ty: &'a LogicalType,
    config: &'a StorageConfig,
    block_manager: &'a dyn BlockManager,
    info: CheckpointInfo,
}

impl<'a> Checkpointer<'a> {
    pub fn new(
        column_start: RowId,
        ty: &'a LogicalType,
        config: &'a StorageConfig,
        block_manager: &'a dyn BlockManager,
        info: CheckpointInfo,
    ) -> Self {
        Self {
            column_start,
            ty,
            config,
            block_manager,
            info,
        }
    }

    fn rewrite_codec(&self) -> CompressionMethod {
        self.info
            .compression
            .unwrap_or(self.config.checkpoint_compression)
    }

    fn segment_capacity(&self) -> usize {
        (self.config.block_size / self.ty.fixed_size()).max(1)
    }

    /// Compacts `segments`, writing fresh persistent segments where needed.
    /// Returns the superseding segment list plus the data pointer records
    /// for the durable catalog entry.
    pub fn checkpoint(
        &self,
        segments: Vec<Arc<ColumnSegment>>,
        overlay: Option<&UpdateOverlay>,
    ) -> Result<(Vec<Arc<ColumnSegment>>, CheckpointResult), CheckpointError> {
        let mut new_segments: Vec<Arc<ColumnSegment>> = Vec::new();
        let mut result = CheckpointResult::default();

        for segment in segments {
            let seg_offset = (segment.start() - self.column_start) as usize;
            let seg_count = segment.count() as usize;
            let touched = overlay
                .map(|ov| ov.has_updates_in_range(seg_offset, seg_count))
                .unwrap_or(false);

            if segment.is_persistent() && !touched && !self.info.force_rewrite {
                // fast path: the durable block is still exact
                let block = segment.block_pointer().ok_or_else(|| {
                    CheckpointError::BlockWrite(
                        "persistent segment without a block pointer".to_string(),
                    )
                })?;
                let stats = segment.stats();
                result.stats.merge(&stats);
                result.data_pointers.push(DataPointer {
                    row_start: segment.start(),
                    row_count: segment.count(),
                    block,
                    compression: segment.compression_method(),
                    stats,
                });
                new_segments.push(segment);
                continue;
            }

            self.rewrite_segment(&segment, overlay, &mut new_segments, &mut result)?;
        }

        info!(
            target: "kolomdb::checkpoint",
            column_start = self.column_start,
            segments = new_segments.len(),
            "Checkpoint produced new segment list"
        );
        Ok((new_segments, result))
    }

    /// Pulls every row of `segment` with committed updates folded in, then
    /// re-encodes the rows into block-bounded persistent segments.
    fn rewrite_segment(
        &self,
        segment: &Arc<ColumnSegment>,
        overlay: Option<&UpdateOverlay>,
        new_segments: &mut Vec<Arc<ColumnSegment>>,
        result: &mut CheckpointResult,
    ) -> Result<(), CheckpointError> {
        let seg_count = segment.count() as usize;
        let seg_offset = (segment.start() - self.column_start) as usize;
        let mut rows: Vec<Value> = Vec::with_capacity(seg_count);

        let mut chunk_start = 0usize;
        while chunk_start < seg_count {
            let chunk = (seg_count - chunk_start).min(self.config.vector_size);
            let mut scratch = self.checkpoint_scan(segment, overlay, seg_offset, chunk_start, chunk);
            scratch.flatten(chunk);
            for i in 0..chunk {
                rows.push(scratch.get(i));
            }
            chunk_start += chunk;
        }

        let capacity = self.segment_capacity();
        let mut row_start = segment.start();
        for slice in rows.chunks(capacity.max(1)) {
            let (new_segment, pointer) = self.write_rows(row_start, slice)?;
            row_start += slice.len() as u64;
            result.stats.merge(&pointer.stats);
            result.data_pointers.push(pointer);
            new_segments.push(new_segment);
        }
        debug!(
            target: "kolomdb::checkpoint",
            start = segment.start(),
            rows = seg_count,
            "Rewrote segment"
        );
        Ok(())
    }

    /// One chunk of the compaction scan: raw segment rows with the
    /// committed overlay view patched on top.
    fn checkpoint_scan(
        &self,
        segment: &Arc<ColumnSegment>,
        overlay: Option<&UpdateOverlay>,
        seg_offset: usize,
        chunk_start: usize,
        chunk: usize,
    ) -> ValueVector {
        let mut scratch = ValueVector::new(self.ty.clone());
        let mut state = segment.initialize_scan();
        segment.skip(&mut state, chunk_start);
        segment.scan(&mut state, chunk, &mut scratch, 0, overlay.is_none());
        if let Some(ov) = overlay {
            scratch.flatten(chunk);
            ov.fetch_committed_range(seg_offset + chunk_start, chunk, &mut scratch);
        }
        scratch
    }

    /// Encodes one run of rows into a persistent segment backed by a fresh
    /// block.
    fn write_rows(
        &self,
        row_start: RowId,
        rows: &[Value],
    ) -> Result<(Arc<ColumnSegment>, DataPointer), CheckpointError> {
        let mut buffer = ValueBuffer::for_type(self.ty);
        let mut validity = ValidityMask::new();
        let mut stats = ColumnStats::new();
        for value in rows {
            validity.push(!value.is_null());
            stats.update(value);
            buffer.push_value(value);
        }
        let payload = SegmentPayload { buffer, validity };

        let method = self.rewrite_codec();
        let codec = codec_for(method);
        let serialized =
            bincode::serialize(&payload).map_err(crate::engine::errors::StorageError::from)?;
        let encoded = codec.compress(&serialized)?;
        let block = self.block_manager.write_block(&encoded)?;

        let pointer = DataPointer {
            row_start,
            row_count: rows.len() as u64,
            block,
            compression: method,
            stats: stats.clone(),
        };
        let segment = Arc::new(ColumnSegment::new_persistent(
            self.ty.clone(),
            row_start,
            method,
            stats,
            block,
            payload,
        ));
        Ok((segment, pointer))
    }
}
