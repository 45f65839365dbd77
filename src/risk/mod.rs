//! Score normalization and ranking.

mod engine;

pub use engine::{RiskEngine, RiskResult};
