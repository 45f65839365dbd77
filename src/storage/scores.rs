//! SQLite-backed score history: one row per run, one row per (run, account).

use crate::config::ModelConfig;
use crate::error::Result;
use crate::risk::RiskResult;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// A stored score row
#[derive(Debug, Clone, PartialEq)]
pub struct StoredScore {
    pub run_id: i64,
    /// 1-based position in the run's ranking
    pub rank: i64,
    pub raw_score: f64,
    pub risk_score: f64,
    pub is_outlier: bool,
}

pub struct ScoreStore {
    conn: Connection,
}

impl ScoreStore {
    /// Open or create DB at path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                accounts INTEGER NOT NULL,
                contamination REAL NOT NULL,
                seed INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS scores (
                run_id INTEGER NOT NULL REFERENCES runs(id),
                account TEXT NOT NULL,
                rank INTEGER NOT NULL,
                raw_score REAL NOT NULL,
                risk_score REAL NOT NULL,
                is_outlier INTEGER NOT NULL,
                PRIMARY KEY (run_id, account)
            );
            CREATE INDEX IF NOT EXISTS idx_scores_account ON scores(account);
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Insert a ranked run atomically; returns the new run id
    pub fn insert_run(&mut self, ranked: &[RiskResult], model: &ModelConfig) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO runs (created_at, accounts, contamination, seed) VALUES (?1, ?2, ?3, ?4)",
            params![
                Utc::now().to_rfc3339(),
                ranked.len() as i64,
                model.contamination,
                model.seed as i64
            ],
        )?;
        let run_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO scores (run_id, account, rank, raw_score, risk_score, is_outlier) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (i, r) in ranked.iter().enumerate() {
                stmt.execute(params![
                    run_id,
                    r.account,
                    i as i64 + 1,
                    r.raw_score,
                    r.score,
                    r.is_outlier
                ])?;
            }
        }
        tx.commit()?;
        tracing::info!(run_id, accounts = ranked.len(), "scores stored");
        Ok(run_id)
    }

    /// Score of `account` in the most recent run that contains it
    pub fn latest_score(&self, account: &str) -> Result<Option<StoredScore>> {
        let row = self
            .conn
            .query_row(
                "SELECT run_id, rank, raw_score, risk_score, is_outlier FROM scores \
                 WHERE account = ?1 ORDER BY run_id DESC LIMIT 1",
                params![account],
                |row| {
                    Ok(StoredScore {
                        run_id: row.get(0)?,
                        rank: row.get(1)?,
                        raw_score: row.get(2)?,
                        risk_score: row.get(3)?,
                        is_outlier: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Retention: delete runs older than `run_id`
    pub fn prune_before(&self, run_id: i64) -> Result<u64> {
        self.conn
            .execute("DELETE FROM scores WHERE run_id < ?1", params![run_id])?;
        let n = self
            .conn
            .execute("DELETE FROM runs WHERE id < ?1", params![run_id])?;
        Ok(n as u64)
    }
}
