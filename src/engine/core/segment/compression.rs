use serde::{Deserialize, Serialize};

use lz4_flex::block::{
    compress_prepend_size as lz4_compress, decompress_size_prepended as lz4_decompress,
};

use crate::engine::errors::StorageError;

/// Compression strategy tag persisted with every data pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionMethod {
    None,
    Lz4,
}

impl CompressionMethod {
    pub fn algo_id(&self) -> u16 {
        match self {
            CompressionMethod::None => 0x0000,
            CompressionMethod::Lz4 => 0x0001,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionMethod::None => "none",
            CompressionMethod::Lz4 => "lz4",
        }
    }

    pub fn parse(name: &str) -> Result<Self, StorageError> {
        match name {
            "none" => Ok(CompressionMethod::None),
            "lz4" => Ok(CompressionMethod::Lz4),
            other => Err(StorageError::UnknownCompression(other.to_string())),
        }
    }

    /// Only uncompressed segments accept incremental appends; compressed
    /// ones are frozen at checkpoint time.
    pub fn supports_append(&self) -> bool {
        matches!(self, CompressionMethod::None)
    }
}

pub trait CompressionCodec: Send + Sync {
    fn method(&self) -> CompressionMethod;
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, StorageError>;
    fn decompress(&self, input: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, StorageError>;
}

pub struct NoneCodec;

impl CompressionCodec for NoneCodec {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::None
    }
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, StorageError> {
        Ok(input.to_vec())
    }
    fn decompress(&self, input: &[u8], _uncompressed_len: usize) -> Result<Vec<u8>, StorageError> {
        Ok(input.to_vec())
    }
}

pub struct Lz4Codec;

impl CompressionCodec for Lz4Codec {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Lz4
    }
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, StorageError> {
        Ok(lz4_compress(input))
    }
    fn decompress(&self, input: &[u8], _uncompressed_len: usize) -> Result<Vec<u8>, StorageError> {
        lz4_decompress(input)
            .map_err(|e| StorageError::Corrupt(format!("lz4 decompress: {e}")))
    }
}

pub fn codec_for(method: CompressionMethod) -> &'static dyn CompressionCodec {
    match method {
        CompressionMethod::None => &NoneCodec,
        CompressionMethod::Lz4 => &Lz4Codec,
    }
}
