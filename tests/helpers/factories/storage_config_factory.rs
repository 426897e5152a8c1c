use crate::engine::core::segment::CompressionMethod;
use crate::engine::core::storage_config::StorageConfig;

/// Builds `StorageConfig` values sized for tests: small blocks so
/// multi-segment behavior shows up with few rows.
pub struct StorageConfigFactory {
    vector_size: usize,
    block_size: usize,
    streaming_segment_rows: usize,
    checkpoint_compression: CompressionMethod,
}

impl StorageConfigFactory {
    pub fn new() -> Self {
        Self {
            vector_size: 1024,
            block_size: 8192,
            streaming_segment_rows: 1024,
            checkpoint_compression: CompressionMethod::Lz4,
        }
    }

    pub fn with_vector_size(mut self, vector_size: usize) -> Self {
        self.vector_size = vector_size;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_streaming_segment_rows(mut self, rows: usize) -> Self {
        self.streaming_segment_rows = rows;
        self
    }

    pub fn with_compression(mut self, method: CompressionMethod) -> Self {
        self.checkpoint_compression = method;
        self
    }

    pub fn create(self) -> StorageConfig {
        StorageConfig {
            vector_size: self.vector_size,
            block_size: self.block_size,
            streaming_segment_rows: self.streaming_segment_rows,
            checkpoint_compression: self.checkpoint_compression,
        }
    }
}
