//! Per-account behavioral feature extraction from filtered events.

mod aggregate;
mod matrix;

pub use aggregate::{
    activity_counts, decimals_presence, fee_gas_stats, inter_event_gap, temporal_stats,
    volume_stats, TemporalStats, TimeSpan,
};
pub use matrix::{column_policies, ColumnPolicy, FeatureExtractor, FeatureMatrix};

use std::collections::BTreeMap;

/// One feature group: named columns and one row per account. A `None` cell is a missing
/// value, resolved later by the column's fill policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    pub columns: Vec<String>,
    pub rows: BTreeMap<String, Vec<Option<f64>>>,
}

impl FeatureFrame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    pub fn get(&self, account: &str, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(account).and_then(|r| r[col])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
