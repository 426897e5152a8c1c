use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::engine::errors::StorageError;
use crate::shared::storage_header::{BinaryHeader, FileKind};

pub const BLOCKS_FILE: &str = "column.blocks";

/// Location of a persisted block: id for bookkeeping, byte offset into the
/// blocks file for retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPointer {
    pub block_id: u64,
    pub offset: u64,
}

/// Block-level persistence collaborator. The engine only requests
/// block-sized allocations at checkpoint time and reads them back when a
/// column is deserialized.
pub trait BlockManager: Send + Sync {
    fn write_block(&self, payload: &[u8]) -> Result<BlockPointer, StorageError>;
    fn read_block(&self, pointer: &BlockPointer) -> Result<Vec<u8>, StorageError>;
    /// Marks a block reclaimable; space is recovered on the next rewrite.
    fn free_block(&self, pointer: &BlockPointer);
    fn block_size(&self) -> usize;
}

/// Append-only blocks file with a magic/CRC header and per-block payload
/// checksums.
pub struct FileBlockManager {
    path: PathBuf,
    file: Mutex<File>,
    next_block_id: AtomicU64,
    block_size: usize,
    freed: Mutex<HashSet<u64>>,
}

impl FileBlockManager {
    pub fn create(dir: &Path, block_size: usize) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(BLOCKS_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&path)?;
        let header = BinaryHeader::new(FileKind::ColumnBlocks.magic(), 1, 0);
        header.write_to(&mut file)?;
        file.flush()?;
        info!(target: "kolomdb::block", path = %path.display(), block_size, "Created blocks file");
        Ok(Self {
            path,
            file: Mutex::new(file),
            next_block_id: AtomicU64::new(0),
            block_size,
            freed: Mutex::new(HashSet::new()),
        })
    }

    pub fn open(dir: &Path, block_size: usize) -> Result<Self, StorageError> {
        let path = dir.join(BLOCKS_FILE);
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let header = BinaryHeader::read_from(&mut file)?;
        if header.magic != FileKind::ColumnBlocks.magic() {
            return Err(StorageError::Corrupt(format!(
                "invalid magic in {}",
                path.display()
            )));
        }
        file.seek(SeekFrom::End(0))?;
        info!(target: "kolomdb::block", path = %path.display(), "Opened blocks file");
        Ok(Self {
            path,
            file: Mutex::new(file),
            next_block_id: AtomicU64::new(0),
            block_size,
            freed: Mutex::new(HashSet::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlockManager for FileBlockManager {
    fn write_block(&self, payload: &[u8]) -> Result<BlockPointer, StorageError> {
        let mut file = self.file.lock().expect("blocks file lock poisoned");
        let offset = file.seek(SeekFrom::End(0))?;
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(payload);
        let crc = hasher.finalize();
        file.write_all(&(payload.len() as u32).to_le_bytes())?;
        file.write_all(&crc.to_le_bytes())?;
        file.write_all(payload)?;
        file.flush()?;
        let block_id = self.next_block_id.fetch_add(1, Ordering::SeqCst);
        debug!(
            target: "kolomdb::block",
            block_id,
            offset,
            len = payload.len(),
            "Wrote block"
        );
        Ok(BlockPointer { block_id, offset })
    }

    fn read_block(&self, pointer: &BlockPointer) -> Result<Vec<u8>, StorageError> {
        let mut file = self.file.lock().expect("blocks file lock poisoned");
        file.seek(SeekFrom::Start(pointer.offset))?;
        let mut len_buf = [0u8; 4];
        file.read_exact(&mut len_buf)?;
        let len = u32::from_le_bytes(len_buf) as usize;
        let mut crc_buf = [0u8; 4];
        file.read_exact(&mut crc_buf)?;
        let expected_crc = u32::from_le_bytes(crc_buf);
        let mut payload = vec![0u8; len];
        file.read_exact(&mut payload)?;
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&payload);
        if hasher.finalize() != expected_crc {
            error!(
                target: "kolomdb::block",
                block_id = pointer.block_id,
                offset = pointer.offset,
                "Block checksum mismatch"
            );
            return Err(StorageError::Corrupt(format!(
                "checksum mismatch for block {}",
                pointer.block_id
            )));
        }
        Ok(payload)
    }

    fn free_block(&self, pointer: &BlockPointer) {
        let mut freed = self.freed.lock().expect("freed set lock poisoned");
        freed.insert(pointer.block_id);
        debug!(target: "kolomdb::block", block_id = pointer.block_id, "Freed block");
    }

    fn block_size(&self) -> usize {
        self.block_size
    }
}
