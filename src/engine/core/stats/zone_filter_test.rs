use crate::engine::core::stats::{ColumnStats, CompareOp, ZoneFilter};
use crate::engine::core::vector::Value;

fn stats_over(values: &[i64]) -> ColumnStats {
    let mut stats = ColumnStats::new();
    for v in values {
        stats.update(&Value::BigInt(*v));
    }
    stats
}

#[test]
fn test_compare_filters_prune_out_of_range_blocks() {
    let stats = stats_over(&[10, 20, 30]);

    let gt_50 = ZoneFilter::Compare {
        op: CompareOp::Gt,
        value: Value::BigInt(50),
    };
    assert!(!gt_50.check_stats(&stats));

    let lt_5 = ZoneFilter::Compare {
        op: CompareOp::Lt,
        value: Value::BigInt(5),
    };
    assert!(!lt_5.check_stats(&stats));

    let eq_20 = ZoneFilter::Compare {
        op: CompareOp::Eq,
        value: Value::BigInt(20),
    };
    assert!(eq_20.check_stats(&stats));
}

#[test]
fn test_zonemap_never_prunes_a_matching_block() {
    // soundness: for every filter that matches at least one value, the
    // stats check must keep the block
    let values = [3i64, 8, 15, 15, 99];
    let stats = stats_over(&values);

    let ops = [
        CompareOp::Eq,
        CompareOp::Neq,
        CompareOp::Gt,
        CompareOp::Gte,
        CompareOp::Lt,
        CompareOp::Lte,
    ];
    for op in ops {
        for probe in [-10i64, 3, 14, 15, 99, 200] {
            let filter = ZoneFilter::Compare {
                op,
                value: Value::BigInt(probe),
            };
            let any_match = values
                .iter()
                .any(|v| filter.matches_value(&Value::BigInt(*v)));
            if any_match {
                assert!(
                    filter.check_stats(&stats),
                    "pruned a block containing a match: {:?} {}",
                    op,
                    probe
                );
            }
        }
    }
}

#[test]
fn test_null_filters_use_null_count() {
    let mut stats = stats_over(&[1, 2]);
    assert!(!ZoneFilter::IsNull.check_stats(&stats));
    assert!(ZoneFilter::IsNotNull.check_stats(&stats));

    stats.update(&Value::Null);
    assert!(ZoneFilter::IsNull.check_stats(&stats));
}

#[test]
fn test_all_null_block_skips_comparisons() {
    let mut stats = ColumnStats::new();
    stats.update(&Value::Null);
    let filter = ZoneFilter::Compare {
        op: CompareOp::Eq,
        value: Value::BigInt(1),
    };
    assert!(!filter.check_stats(&stats));
    assert!(!ZoneFilter::IsNotNull.check_stats(&stats));
}

#[test]
fn test_neq_prunes_only_constant_blocks() {
    let constant = stats_over(&[7, 7, 7]);
    let filter = ZoneFilter::Compare {
        op: CompareOp::Neq,
        value: Value::BigInt(7),
    };
    assert!(!filter.check_stats(&constant));

    let mixed = stats_over(&[7, 8]);
    assert!(filter.check_stats(&mixed));
}
