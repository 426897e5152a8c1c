use crate::shared::storage_header::{BinaryHeader, FileKind};

#[test]
fn test_header_roundtrip() {
    let header = BinaryHeader::new(FileKind::ColumnBlocks.magic(), 1, 0);
    let mut buf = Vec::new();
    header.write_to(&mut buf).unwrap();
    assert_eq!(buf.len(), BinaryHeader::TOTAL_LEN);

    let read_back = BinaryHeader::read_from(&buf[..]).unwrap();
    assert_eq!(read_back, header);
}

#[test]
fn test_header_crc_detects_corruption() {
    let header = BinaryHeader::new(FileKind::ColumnBlocks.magic(), 1, 0);
    let mut buf = Vec::new();
    header.write_to(&mut buf).unwrap();

    // flip a bit in the magic
    buf[0] ^= 0xFF;
    let err = BinaryHeader::read_from(&buf[..]).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn test_file_kinds_have_distinct_magics() {
    assert_ne!(
        FileKind::ColumnBlocks.magic(),
        FileKind::DataPointers.magic()
    );
}
