//! Turns raw anomaly scores into the bounded risk score and the final ranking.

use crate::config::ScoreConfig;
use serde::{Deserialize, Serialize};

/// Final per-account output row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    #[serde(rename = "wallet_address")]
    pub account: String,
    #[serde(rename = "risk_score_scaled")]
    pub score: f64,
    pub raw_score: f64,
    pub is_outlier: bool,
}

pub struct RiskEngine {
    config: ScoreConfig,
}

impl RiskEngine {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    /// Min-max scale `raw` onto `[config.min, config.max]`, fit on `raw` itself.
    /// When every raw score is equal the range is degenerate and all scores map to `config.min`.
    pub fn normalize(&self, raw: &[f64]) -> Vec<f64> {
        let (lo, hi) = raw
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| (lo.min(r), hi.max(r)));
        let span = hi - lo;
        if raw.is_empty() || !(span > 0.0) {
            if !raw.is_empty() {
                tracing::warn!(
                    accounts = raw.len(),
                    raw = lo,
                    "degenerate score range; assigning constant score"
                );
            }
            return vec![self.config.min; raw.len()];
        }
        let width = self.config.max - self.config.min;
        raw.iter()
            .map(|r| (self.config.min + (r - lo) / span * width).clamp(self.config.min, self.config.max))
            .collect()
    }

    /// Pair accounts with scores and sort: score descending, account ascending on ties.
    pub fn rank(
        &self,
        accounts: &[String],
        raw: &[f64],
        scaled: &[f64],
        outliers: &[bool],
    ) -> Vec<RiskResult> {
        let mut results: Vec<RiskResult> = accounts
            .iter()
            .zip(raw)
            .zip(scaled)
            .zip(outliers)
            .map(|(((account, raw), score), outlier)| RiskResult {
                account: account.clone(),
                score: *score,
                raw_score: *raw,
                is_outlier: *outlier,
            })
            .collect();
        // Total order, so the comparator stays consistent even on NaN.
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.account.cmp(&b.account))
        });
        results
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }
}
