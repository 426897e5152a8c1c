use crate::engine::core::segment::CompressionMethod;
use crate::engine::errors::StorageError;
use crate::shared::config::Settings;

/// Sizing and policy knobs threaded explicitly into the storage structures,
/// so tests can exercise non-default vector and block sizes.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Rows per scan/append batch.
    pub vector_size: usize,
    /// Bytes per storage block; bounds transient segment capacity.
    pub block_size: usize,
    /// Row capacity of segments created for append-only streaming columns
    /// (the `MAX_ROW_ID` start-row sentinel).
    pub streaming_segment_rows: usize,
    /// Codec applied when checkpoint rewrites a segment.
    pub checkpoint_compression: CompressionMethod,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            vector_size: 2048,
            block_size: 256 * 1024,
            streaming_segment_rows: 1024,
            checkpoint_compression: CompressionMethod::Lz4,
        }
    }
}

impl StorageConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, StorageError> {
        Ok(Self {
            vector_size: settings.engine.vector_size,
            block_size: settings.engine.block_size,
            streaming_segment_rows: settings.engine.streaming_segment_rows,
            checkpoint_compression: CompressionMethod::parse(
                &settings.engine.checkpoint_compression,
            )?,
        })
    }
}
