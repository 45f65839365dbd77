//! Thin sinks for ranked results: CSV file and SQLite score history.

mod export;
mod scores;

pub use export::{write_csv, write_csv_path};
pub use scores::{ScoreStore, StoredScore};
