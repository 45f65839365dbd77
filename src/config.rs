//! Scoring configuration. Every section has defaults matching the lending-protocol export.

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Event selection and input column contract
    pub events: EventsConfig,
    /// Isolation forest parameters
    pub model: ModelConfig,
    /// Target range of the normalized score
    pub score: ScoreConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Event types kept for feature extraction; order fixes the count column order
    pub relevant_types: Vec<String>,
    pub columns: ColumnsConfig,
}

/// Names of the input columns consumed by the pipeline. Everything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub account: String,
    pub event_type: String,
    pub timestamp: String,
    pub value_base: String,
    pub value_quote: String,
    pub fee: String,
    pub gas_price: String,
    pub gas_spent: String,
    pub decimals: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Expected outlier fraction, in (0, 0.5]. Only moves the outlier threshold.
    pub contamination: f64,
    /// Number of isolation trees
    pub n_estimators: usize,
    /// Rows sampled per tree (capped at the account count)
    pub max_samples: usize,
    /// RNG seed; identical input and seed reproduce identical scores
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// CSV event export
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Ranked `wallet_address,risk_score_scaled` CSV
    pub csv_path: PathBuf,
    /// Optional SQLite score table
    pub sqlite_path: Option<PathBuf>,
    /// Echo ranked results to stdout as JSON lines
    pub ndjson: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

/// The eight lending-protocol events considered for risk features.
pub const DEFAULT_RELEVANT_TYPES: [&str; 8] = [
    "Deposit",
    "RedeemUnderlying",
    "Withdraw",
    "Borrow",
    "Repay",
    "RepayBorrow",
    "LiquidateBorrow",
    "LiquidationCall",
];

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            relevant_types: DEFAULT_RELEVANT_TYPES.iter().map(|s| s.to_string()).collect(),
            columns: ColumnsConfig::default(),
        }
    }
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            account: "wallet_address".to_string(),
            event_type: "event_name".to_string(),
            timestamp: "block_signed_at".to_string(),
            value_base: "value_eth".to_string(),
            value_quote: "value_quote_usd".to_string(),
            fee: "fees_paid_eth".to_string(),
            gas_price: "gas_price".to_string(),
            gas_spent: "gas_spent".to_string(),
            decimals: "sender_contract_decimals".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            contamination: 0.10,
            n_estimators: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1000.0,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("wallet_data.csv"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("Wallet_Risk_Scoring.csv"),
            sqlite_path: None,
            ndjson: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl ScoringConfig {
    /// Load from JSON file if present; a missing file is the default config.
    /// Read and parse failures are returned so the caller can report them once
    /// logging is up.
    pub fn try_load(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Like [`try_load`](Self::try_load), falling back to the default on any error.
    pub fn load(path: &std::path::Path) -> Self {
        Self::try_load(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "config unreadable; using defaults");
            Self::default()
        })
    }

    /// Reject settings the pipeline cannot run with, before any data is read.
    pub fn validate(&self) -> Result<()> {
        let m = &self.model;
        if !(m.contamination > 0.0 && m.contamination <= 0.5) {
            return Err(RiskError::InvalidConfig(format!(
                "contamination must be in (0, 0.5], got {}",
                m.contamination
            )));
        }
        if m.n_estimators == 0 {
            return Err(RiskError::InvalidConfig("n_estimators must be positive".into()));
        }
        if m.max_samples < 2 {
            return Err(RiskError::InvalidConfig("max_samples must be at least 2".into()));
        }
        if !(self.score.min.is_finite() && self.score.max.is_finite()) || self.score.max <= self.score.min {
            return Err(RiskError::InvalidConfig(format!(
                "score range [{}, {}] is empty",
                self.score.min, self.score.max
            )));
        }
        if self.events.relevant_types.is_empty() {
            return Err(RiskError::InvalidConfig("relevant_types is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_lending_export() {
        let c = ScoringConfig::default();
        assert_eq!(c.model.contamination, 0.10);
        assert_eq!(c.model.seed, 42);
        assert_eq!(c.score.max, 1000.0);
        assert_eq!(c.events.relevant_types.len(), 8);
        assert_eq!(c.events.columns.account, "wallet_address");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c: ScoringConfig = serde_json::from_str(r#"{"model":{"contamination":0.2}}"#).unwrap();
        assert_eq!(c.model.contamination, 0.2);
        assert_eq!(c.model.n_estimators, 100);
        assert_eq!(c.events.columns.timestamp, "block_signed_at");
    }

    #[test]
    fn unparsable_file_is_an_error_not_a_silent_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"model": {"contamination": "oops""#).unwrap();

        assert!(matches!(ScoringConfig::try_load(&path), Err(RiskError::Json(_))));
        let c = ScoringConfig::load(&path);
        assert_eq!(c.model.contamination, 0.10);

        let missing = dir.path().join("absent.json");
        assert_eq!(ScoringConfig::try_load(&missing).unwrap().model.seed, 42);
    }

    #[test]
    fn rejects_bad_contamination_and_range() {
        let mut c = ScoringConfig::default();
        c.model.contamination = 0.0;
        assert!(matches!(c.validate(), Err(RiskError::InvalidConfig(_))));
        c.model.contamination = 0.6;
        assert!(c.validate().is_err());

        let mut c = ScoringConfig::default();
        c.score.max = c.score.min;
        assert!(c.validate().is_err());
    }
}
