pub mod block;
pub mod checkpoint;
pub mod column;
pub mod segment;
pub mod stats;
pub mod storage_config;
pub mod update;
pub mod vector;

pub use block::{BlockManager, BlockPointer, FileBlockManager};
pub use checkpoint::{CheckpointInfo, CheckpointResult, Checkpointer, DataPointer};
pub use column::{
    AnyColumnData, ColumnAppendState, ColumnCheckpointResult, ColumnData, ColumnFetchState,
    ColumnRole, ColumnScanState, ColumnSegmentInfo, ScanMode, ScanOptions, create_column,
};
pub use segment::{ColumnSegment, CompressionMethod, SegmentDirectory};
pub use stats::{ColumnStats, CompareOp, ZoneFilter};
pub use storage_config::StorageConfig;
pub use update::{TRANSACTION_ID_START, TransactionData, UpdateOverlay};
pub use vector::{LogicalType, MAX_ROW_ID, RowId, SelectionVector, Value, ValueVector};
