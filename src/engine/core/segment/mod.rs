pub mod column_segment;
pub mod compression;
pub mod directory;

pub use column_segment::{
    ColumnSegment, SegmentAppendState, SegmentKind, SegmentPayload, SegmentScanState,
};
pub use compression::{CompressionCodec, CompressionMethod, Lz4Codec, NoneCodec, codec_for};
pub use directory::SegmentDirectory;

#[cfg(test)]
mod compression_test;
#[cfg(test)]
mod directory_test;
