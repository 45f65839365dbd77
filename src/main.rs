//! Wallet risk entrypoint: one batch run over an event export.
//! Config path is the first argument, else `WALLET_RISK_CONFIG`, else `config.json`.

use wallet_risk::{
    config::ScoringConfig,
    events::RawTable,
    logging::StructuredLogger,
    pipeline::RiskPipeline,
    storage::{self, ScoreStore},
};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("WALLET_RISK_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.json"));
    // Parse before logging is configured, report after.
    let (config, load_error) = match ScoringConfig::try_load(&config_path) {
        Ok(c) => (c, None),
        Err(e) => (ScoringConfig::default(), Some(e)),
    };

    StructuredLogger::init(config.log.json, &config.log.level);
    if let Some(e) = load_error {
        warn!(path = %config_path.display(), error = %e, "config unreadable; using defaults");
    }

    info!(
        config = %config_path.display(),
        input = %config.input.path.display(),
        contamination = config.model.contamination,
        seed = config.model.seed,
        "wallet risk scoring starting"
    );

    let pipeline = RiskPipeline::new(config.clone())?;
    let table = RawTable::from_path(&config.input.path)?;
    let report = pipeline.run(&table)?;

    storage::write_csv_path(&config.output.csv_path, &report.ranked)?;

    if let Some(db_path) = &config.output.sqlite_path {
        let mut store = ScoreStore::open(db_path)?;
        let run_id = store.insert_run(&report.ranked, &config.model)?;
        info!(run_id, db = %db_path.display(), "run recorded");
    }

    if config.output.ndjson {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for r in &report.ranked {
            StructuredLogger::emit_json(r, &mut out)?;
        }
        out.flush()?;
    }

    info!(accounts = report.ranked.len(), "wallet risk scoring complete");
    Ok(())
}
