use std::sync::Arc;

use tempfile::TempDir;

use crate::engine::core::block::FileBlockManager;

/// Creates file-backed block managers rooted in fresh temp dirs. The
/// returned `TempDir` must stay alive for the duration of the test.
pub struct BlockManagerFactory {
    block_size: usize,
}

impl BlockManagerFactory {
    pub fn new() -> Self {
        Self { block_size: 8192 }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn create(self) -> (Arc<FileBlockManager>, TempDir) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let manager =
            FileBlockManager::create(dir.path(), self.block_size).expect("create block manager");
        (Arc::new(manager), dir)
    }
}
