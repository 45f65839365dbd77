//! One scoring run: raw table → filtered events → feature matrix → raw scores → ranked risk.
//! Every run recomputes from scratch; nothing survives between runs.

use crate::config::ScoringConfig;
use crate::error::{Result, RiskError};
use crate::events::{EventFilter, RawTable};
use crate::features::{FeatureExtractor, FeatureMatrix};
use crate::model::{AnomalyScorer, AnomalyScores};
use crate::risk::{RiskEngine, RiskResult};
use std::time::Instant;
use tracing::info;

/// Everything a run produced, for export or inspection
#[derive(Debug, Clone)]
pub struct RiskReport {
    pub matrix: FeatureMatrix,
    /// Row-aligned with `matrix.accounts`
    pub scores: AnomalyScores,
    /// Row-aligned with `matrix.accounts`
    pub scaled: Vec<f64>,
    /// Sorted by score descending, account ascending
    pub ranked: Vec<RiskResult>,
}

impl RiskReport {
    pub fn get(&self, account: &str) -> Option<&RiskResult> {
        self.ranked.iter().find(|r| r.account == account)
    }
}

pub struct RiskPipeline {
    config: ScoringConfig,
    filter: EventFilter,
    extractor: FeatureExtractor,
    engine: RiskEngine,
}

impl RiskPipeline {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            filter: EventFilter::new(&config.events),
            extractor: FeatureExtractor::new(&config.events),
            engine: RiskEngine::new(config.score.clone()),
            config,
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn run(&self, table: &RawTable) -> Result<RiskReport> {
        let start = Instant::now();
        let events = self.filter.filter(table)?;
        if events.is_empty() {
            return Err(RiskError::EmptyFilteredSet);
        }

        let matrix = self.extractor.extract(&events)?;
        // Fresh detector per run.
        let scores = AnomalyScorer::new(&self.config.model).fit_score(&matrix)?;
        let scaled = self.engine.normalize(&scores.raw);
        let ranked = self
            .engine
            .rank(&matrix.accounts, &scores.raw, &scaled, &scores.outliers);

        info!(
            events = events.len(),
            accounts = ranked.len(),
            outliers = scores.outlier_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "risk scoring run complete"
        );
        Ok(RiskReport {
            matrix,
            scores,
            scaled,
            ranked,
        })
    }
}
