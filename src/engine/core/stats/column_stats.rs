use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::engine::core::vector::Value;

/// Min/max/null-count aggregate for a column or a single segment.
///
/// Merging only ever widens the bounds, so a merged aggregate stays sound
/// for zonemap pruning even when it is no longer tight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub null_count: u64,
}

impl ColumnStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: &Value) {
        if value.is_null() {
            self.null_count += 1;
            return;
        }
        match &self.min {
            None => self.min = Some(value.clone()),
            Some(current) => {
                if value.compare(current) == Some(Ordering::Less) {
                    self.min = Some(value.clone());
                }
            }
        }
        match &self.max {
            None => self.max = Some(value.clone()),
            Some(current) => {
                if value.compare(current) == Some(Ordering::Greater) {
                    self.max = Some(value.clone());
                }
            }
        }
    }

    pub fn merge(&mut self, other: &ColumnStats) {
        if let Some(other_min) = &other.min {
            match &self.min {
                None => self.min = Some(other_min.clone()),
                Some(current) => {
                    if other_min.compare(current) == Some(Ordering::Less) {
                        self.min = Some(other_min.clone());
                    }
                }
            }
        }
        if let Some(other_max) = &other.max {
            match &self.max {
                None => self.max = Some(other_max.clone()),
                Some(current) => {
                    if other_max.compare(current) == Some(Ordering::Greater) {
                        self.max = Some(other_max.clone());
                    }
                }
            }
        }
        self.null_count += other.null_count;
    }

    pub fn has_null(&self) -> bool {
        self.null_count > 0
    }

    /// Textual summary for diagnostic introspection.
    pub fn summary(&self) -> String {
        serde_json::json!({
            "min": self.min,
            "max": self.max,
            "null_count": self.null_count,
        })
        .to_string()
    }
}
