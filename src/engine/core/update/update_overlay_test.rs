use crate::engine::core::update::{TRANSACTION_ID_START, TransactionData, UpdateOverlay};
use crate::engine::core::vector::{LogicalType, Value, ValueVector};

fn overlay() -> UpdateOverlay {
    UpdateOverlay::new(0, 4)
}

fn bigint_vector(values: &[i64]) -> ValueVector {
    ValueVector::from_values(
        LogicalType::BigInt,
        values.iter().map(|v| Value::BigInt(*v)).collect(),
    )
}

fn txn(n: u64, start_time: u64) -> TransactionData {
    TransactionData::new(TRANSACTION_ID_START + n, start_time)
}

#[test]
fn test_uncommitted_update_visible_only_to_writer() {
    let mut overlay = overlay();
    let writer = txn(1, 10);
    let values = bigint_vector(&[100]);
    overlay
        .update(writer, &[2], &values, &[Value::BigInt(2)])
        .unwrap();

    // writer sees its own update
    let mut result = bigint_vector(&[0, 1, 2, 3]);
    overlay.fetch_updates(Some(&writer), 0, &mut result, 4);
    assert_eq!(result.get(2), Value::BigInt(100));

    // another transaction does not
    let reader = txn(2, 10);
    let mut result = bigint_vector(&[0, 1, 2, 3]);
    overlay.fetch_updates(Some(&reader), 0, &mut result, 4);
    assert_eq!(result.get(2), Value::BigInt(2));

    // neither does the committed view
    let mut result = bigint_vector(&[0, 1, 2, 3]);
    overlay.fetch_updates(None, 0, &mut result, 4);
    assert_eq!(result.get(2), Value::BigInt(2));
}

#[test]
fn test_commit_respects_reader_snapshots() {
    let mut overlay = overlay();
    let writer = txn(1, 10);
    overlay
        .update(writer, &[1], &bigint_vector(&[777]), &[Value::BigInt(1)])
        .unwrap();
    overlay.commit(writer.transaction_id, 20);

    // snapshot taken before the commit point: old value
    let early = txn(5, 15);
    let mut result = bigint_vector(&[0, 1, 2, 3]);
    overlay.fetch_updates(Some(&early), 0, &mut result, 4);
    assert_eq!(result.get(1), Value::BigInt(1));

    // snapshot at/after the commit point: new value
    let late = txn(6, 20);
    let mut result = bigint_vector(&[0, 1, 2, 3]);
    overlay.fetch_updates(Some(&late), 0, &mut result, 4);
    assert_eq!(result.get(1), Value::BigInt(777));
}

#[test]
fn test_rollback_discards_uncommitted_versions() {
    let mut overlay = overlay();
    let writer = txn(1, 10);
    overlay
        .update(writer, &[0], &bigint_vector(&[42]), &[Value::BigInt(0)])
        .unwrap();
    assert!(!overlay.is_empty());

    overlay.rollback(writer.transaction_id);
    assert!(overlay.is_empty());

    let mut result = bigint_vector(&[0]);
    overlay.fetch_updates(Some(&writer), 0, &mut result, 1);
    assert_eq!(result.get(0), Value::BigInt(0));
}

#[test]
fn test_write_write_conflict_on_same_row() {
    let mut overlay = overlay();
    let first = txn(1, 10);
    let second = txn(2, 10);
    overlay
        .update(first, &[3], &bigint_vector(&[1]), &[Value::BigInt(3)])
        .unwrap();
    let err = overlay
        .update(second, &[3], &bigint_vector(&[2]), &[Value::BigInt(3)])
        .unwrap_err();
    assert!(matches!(
        err,
        crate::engine::errors::StorageError::TransactionConflict(_)
    ));
}

#[test]
fn test_fetch_committed_range_crosses_blocks() {
    // vector_size = 4, rows 3 and 5 live in different blocks
    let mut overlay = overlay();
    let writer = txn(1, 10);
    overlay
        .update(
            writer,
            &[3, 5],
            &bigint_vector(&[33, 55]),
            &[Value::BigInt(3), Value::BigInt(5)],
        )
        .unwrap();
    overlay.commit(writer.transaction_id, 11);

    let mut result = bigint_vector(&[2, 3, 4, 5, 6]);
    overlay.fetch_committed_range(2, 5, &mut result);
    assert_eq!(result.get(0), Value::BigInt(2));
    assert_eq!(result.get(1), Value::BigInt(33));
    assert_eq!(result.get(3), Value::BigInt(55));
}

#[test]
fn test_has_uncommitted_tracks_commit() {
    let mut overlay = overlay();
    let writer = txn(1, 10);
    overlay
        .update(writer, &[1], &bigint_vector(&[9]), &[Value::BigInt(1)])
        .unwrap();
    assert!(overlay.has_uncommitted(0));
    assert!(!overlay.has_uncommitted(1));

    overlay.commit(writer.transaction_id, 12);
    assert!(!overlay.has_uncommitted(0));
}

#[test]
fn test_has_updates_in_range() {
    let mut overlay = overlay();
    let writer = txn(1, 10);
    overlay
        .update(writer, &[6], &bigint_vector(&[60]), &[Value::BigInt(6)])
        .unwrap();

    assert!(overlay.has_updates_in_range(4, 4));
    assert!(overlay.has_updates_in_range(6, 1));
    assert!(!overlay.has_updates_in_range(0, 6));
    assert!(!overlay.has_updates_in_range(7, 10));
}

#[test]
fn test_base_value_kept_for_undo() {
    let mut overlay = overlay();
    let writer = txn(1, 10);
    overlay
        .update(writer, &[2], &bigint_vector(&[20]), &[Value::BigInt(2)])
        .unwrap();
    assert_eq!(overlay.base_value(2), Some(&Value::BigInt(2)));
    assert_eq!(overlay.base_value(3), None);
}
