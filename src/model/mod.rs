//! Unsupervised anomaly scoring over the feature matrix.
//!
//! Detectors keep their native score convention behind [`AnomalyDetector::polarity`];
//! [`AnomalyScorer`] is the only place that reads it, and always hands out raw scores
//! where higher means more anomalous.

mod isolation_forest;

pub use isolation_forest::{IsolationForest, IsolationTree};

use crate::config::ModelConfig;
use crate::error::Result;
use crate::features::FeatureMatrix;
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Direction of a detector's native score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsAnomalous,
    LowerIsAnomalous,
}

/// Trait for anomaly detectors
pub trait AnomalyDetector {
    /// Fit on the full matrix (no train/test split)
    fn fit(&mut self, x: ArrayView2<f64>) -> Result<()>;

    /// Native per-row scores; direction given by [`Self::polarity`]
    fn score_samples(&self, x: ArrayView2<f64>) -> Result<Array1<f64>>;

    fn polarity(&self) -> Polarity;

    fn name(&self) -> &str;
}

/// Raw scores for one fitted matrix, row-aligned with `FeatureMatrix::accounts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScores {
    /// Higher = more anomalous
    pub raw: Vec<f64>,
    /// Raw scores strictly above this are flagged
    pub threshold: f64,
    pub outliers: Vec<bool>,
}

impl AnomalyScores {
    pub fn outlier_count(&self) -> usize {
        self.outliers.iter().filter(|o| **o).count()
    }
}

/// Fits a detector and orients its output. Built per run; holds no process-wide state.
pub struct AnomalyScorer<D: AnomalyDetector = IsolationForest> {
    detector: D,
    contamination: f64,
}

impl AnomalyScorer<IsolationForest> {
    pub fn new(config: &ModelConfig) -> Self {
        Self::with_detector(IsolationForest::new(config), config.contamination)
    }
}

impl<D: AnomalyDetector> AnomalyScorer<D> {
    pub fn with_detector(detector: D, contamination: f64) -> Self {
        Self {
            detector,
            contamination,
        }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Fit on `matrix` and score the same rows.
    pub fn fit_score(&mut self, matrix: &FeatureMatrix) -> Result<AnomalyScores> {
        let x = matrix.values.view();
        self.detector.fit(x)?;
        let native = self.detector.score_samples(x)?;
        let raw: Vec<f64> = match self.detector.polarity() {
            Polarity::HigherIsAnomalous => native.to_vec(),
            Polarity::LowerIsAnomalous => native.iter().map(|s| -s).collect(),
        };

        let threshold = percentile(&raw, 1.0 - self.contamination);
        let outliers: Vec<bool> = raw.iter().map(|s| *s > threshold).collect();
        let scores = AnomalyScores {
            raw,
            threshold,
            outliers,
        };
        tracing::info!(
            detector = self.detector.name(),
            accounts = matrix.n_accounts(),
            contamination = self.contamination,
            threshold,
            outliers = scores.outlier_count(),
            "anomaly scores computed"
        );
        Ok(scores)
    }
}

/// Linear-interpolated quantile, `q` in [0, 1]. Empty input yields NaN.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
