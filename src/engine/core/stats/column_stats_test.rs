use crate::engine::core::stats::ColumnStats;
use crate::engine::core::vector::Value;

#[test]
fn test_update_tracks_min_max_and_nulls() {
    let mut stats = ColumnStats::new();
    stats.update(&Value::BigInt(5));
    stats.update(&Value::BigInt(-3));
    stats.update(&Value::Null);
    stats.update(&Value::BigInt(12));

    assert_eq!(stats.min, Some(Value::BigInt(-3)));
    assert_eq!(stats.max, Some(Value::BigInt(12)));
    assert_eq!(stats.null_count, 1);
}

#[test]
fn test_merge_widens_bounds() {
    let mut left = ColumnStats::new();
    left.update(&Value::Integer(10));
    left.update(&Value::Integer(20));

    let mut right = ColumnStats::new();
    right.update(&Value::Integer(-5));
    right.update(&Value::Null);

    left.merge(&right);
    assert_eq!(left.min, Some(Value::Integer(-5)));
    assert_eq!(left.max, Some(Value::Integer(20)));
    assert_eq!(left.null_count, 1);
}

#[test]
fn test_merge_with_empty_is_identity() {
    let mut stats = ColumnStats::new();
    stats.update(&Value::Varchar("m".into()));

    let before = stats.clone();
    stats.merge(&ColumnStats::new());
    assert_eq!(stats, before);
}

#[test]
fn test_summary_is_json() {
    let mut stats = ColumnStats::new();
    stats.update(&Value::BigInt(7));
    let summary = stats.summary();
    let parsed: serde_json::Value = serde_json::from_str(&summary).unwrap();
    assert_eq!(parsed["null_count"], 0);
}
