//! Ranked CSV output: `wallet_address,risk_score_scaled`, highest risk first.

use crate::error::Result;
use crate::risk::RiskResult;
use std::io::Write;
use std::path::Path;

pub fn write_csv<W: Write>(writer: W, ranked: &[RiskResult]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["wallet_address", "risk_score_scaled"])?;
    for r in ranked {
        w.write_record([r.account.as_str(), r.score.to_string().as_str()])?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_csv_path(path: &Path, ranked: &[RiskResult]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), ranked)?;
    tracing::info!(path = %path.display(), rows = ranked.len(), "risk scores written");
    Ok(())
}
