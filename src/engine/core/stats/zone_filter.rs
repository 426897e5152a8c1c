use std::cmp::Ordering;

use super::column_stats::ColumnStats;
use crate::engine::core::vector::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn evaluate(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Neq => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }
}

/// Predicate pushed down into a scan. Evaluated per row against values and
/// per block against aggregate statistics.
#[derive(Debug, Clone)]
pub enum ZoneFilter {
    Compare { op: CompareOp, value: Value },
    IsNull,
    IsNotNull,
}

impl ZoneFilter {
    pub fn matches_value(&self, value: &Value) -> bool {
        match self {
            ZoneFilter::IsNull => value.is_null(),
            ZoneFilter::IsNotNull => !value.is_null(),
            ZoneFilter::Compare { op, value: rhs } => match value.compare(rhs) {
                Some(ordering) => op.evaluate(ordering),
                None => false,
            },
        }
    }

    /// Zonemap check: returns false only when no row described by `stats`
    /// can match. Incomparable or missing bounds always return true.
    pub fn check_stats(&self, stats: &ColumnStats) -> bool {
        match self {
            ZoneFilter::IsNull => stats.has_null(),
            ZoneFilter::IsNotNull => stats.min.is_some(),
            ZoneFilter::Compare { op, value } => {
                let (min, max) = match (&stats.min, &stats.max) {
                    (Some(min), Some(max)) => (min, max),
                    // no non-null rows: a comparison can never match
                    _ => return false,
                };
                let min_ord = min.compare(value);
                let max_ord = max.compare(value);
                let (min_ord, max_ord) = match (min_ord, max_ord) {
                    (Some(a), Some(b)) => (a, b),
                    // incomparable bounds: never prune
                    _ => return true,
                };
                match op {
                    CompareOp::Eq => {
                        min_ord != Ordering::Greater && max_ord != Ordering::Less
                    }
                    CompareOp::Neq => {
                        // only an all-equal block can be skipped
                        !(min_ord == Ordering::Equal && max_ord == Ordering::Equal)
                    }
                    CompareOp::Gt => max_ord == Ordering::Greater,
                    CompareOp::Gte => max_ord != Ordering::Less,
                    CompareOp::Lt => min_ord == Ordering::Less,
                    CompareOp::Lte => min_ord != Ordering::Greater,
                }
            }
        }
    }
}
