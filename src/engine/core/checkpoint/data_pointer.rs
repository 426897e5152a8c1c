use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::engine::core::block::BlockPointer;
use crate::engine::core::segment::CompressionMethod;
use crate::engine::core::stats::ColumnStats;
use crate::engine::core::vector::RowId;
use crate::engine::errors::StorageError;
use crate::shared::storage_header::{BinaryHeader, FileKind};

/// Durable record of one persistent segment: enough to reconstruct the
/// segment directory exactly after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPointer {
    pub row_start: RowId,
    pub row_count: u64,
    pub block: BlockPointer,
    pub compression: CompressionMethod,
    pub stats: ColumnStats,
}

impl DataPointer {
    /// Writes a column's data pointer list to `path` behind the standard
    /// magic/CRC header.
    pub fn save(path: &Path, pointers: &[DataPointer]) -> Result<(), StorageError> {
        let mut file = File::create(path).map_err(|e| {
            error!(target: "kolomdb::checkpoint", error = %e, path = %path.display(), "Failed to create data pointer file");
            StorageError::Io(e)
        })?;
        let header = BinaryHeader::new(FileKind::DataPointers.magic(), 1, 0);
        header.write_to(&mut file)?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, pointers)?;
        debug!(
            target: "kolomdb::checkpoint",
            count = pointers.len(),
            path = %path.display(),
            "Wrote data pointers"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Vec<DataPointer>, StorageError> {
        let mut file = File::open(path)?;
        let header = BinaryHeader::read_from(&mut file)?;
        if header.magic != FileKind::DataPointers.magic() {
            return Err(StorageError::Corrupt(format!(
                "invalid magic in {}",
                path.display()
            )));
        }
        let reader = BufReader::new(file);
        let pointers: Vec<DataPointer> = bincode::deserialize_from(reader)?;
        debug!(
            target: "kolomdb::checkpoint",
            count = pointers.len(),
            path = %path.display(),
            "Loaded data pointers"
        );
        Ok(pointers)
    }
}
