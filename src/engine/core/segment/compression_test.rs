use crate::engine::core::segment::compression::{CompressionMethod, codec_for};

#[test]
fn test_lz4_roundtrip() {
    let codec = codec_for(CompressionMethod::Lz4);
    let input: Vec<u8> = (0..4096u32).flat_map(|v| (v % 17).to_le_bytes()).collect();
    let compressed = codec.compress(&input).unwrap();
    assert!(compressed.len() < input.len());
    let restored = codec.decompress(&compressed, input.len()).unwrap();
    assert_eq!(restored, input);
}

#[test]
fn test_none_codec_is_identity() {
    let codec = codec_for(CompressionMethod::None);
    let input = b"plain bytes".to_vec();
    let compressed = codec.compress(&input).unwrap();
    assert_eq!(compressed, input);
    assert_eq!(codec.decompress(&compressed, input.len()).unwrap(), input);
}

#[test]
fn test_method_parse_and_names() {
    assert_eq!(
        CompressionMethod::parse("lz4").unwrap(),
        CompressionMethod::Lz4
    );
    assert_eq!(
        CompressionMethod::parse("none").unwrap(),
        CompressionMethod::None
    );
    assert!(CompressionMethod::parse("snappy").is_err());
    assert_eq!(CompressionMethod::Lz4.as_str(), "lz4");
    assert!(CompressionMethod::None.supports_append());
    assert!(!CompressionMethod::Lz4.supports_append());
}

#[test]
fn test_corrupt_lz4_input_fails() {
    let codec = codec_for(CompressionMethod::Lz4);
    let err = codec.decompress(&[1, 2, 3], 100).unwrap_err();
    assert!(matches!(
        err,
        crate::engine::errors::StorageError::Corrupt(_)
    ));
}
