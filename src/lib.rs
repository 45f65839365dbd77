//! Wallet risk scoring: batch anomaly-based risk scores for lending-protocol accounts.
//!
//! Modular structure:
//! - [`events`] — Raw event table, timestamp parsing, relevant-type filtering
//! - [`features`] — Per-account aggregation and feature matrix assembly
//! - [`model`] — Isolation forest anomaly scoring
//! - [`risk`] — Score normalization and ranking
//! - [`storage`] — CSV and SQLite sinks
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod events;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod risk;
pub mod storage;
pub mod logging;

pub use config::ScoringConfig;
pub use error::{Result, RiskError};
pub use events::{Event, EventFilter, RawTable};
pub use features::{FeatureExtractor, FeatureMatrix};
pub use model::{AnomalyDetector, AnomalyScorer, IsolationForest};
pub use pipeline::{RiskPipeline, RiskReport};
pub use risk::{RiskEngine, RiskResult};
pub use storage::ScoreStore;
pub use logging::StructuredLogger;
