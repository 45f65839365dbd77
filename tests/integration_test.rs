//! Integration test: config load, full scoring run, ranking properties, sinks.

use wallet_risk::{
    config::ScoringConfig,
    error::RiskError,
    events::RawTable,
    pipeline::{RiskPipeline, RiskReport},
    storage::{self, ScoreStore},
};
use std::path::Path;

const HEADER: &str = "wallet_address,event_name,block_signed_at,value_eth,value_quote_usd,\
fees_paid_eth,gas_price,gas_spent,sender_contract_decimals,to_address,successful";

/// Seconds after 2021-03-01T00:00:00Z, rendered the way the export does
fn ts(secs: i64) -> String {
    let base = chrono::DateTime::parse_from_rfc3339("2021-03-01T00:00:00Z").unwrap();
    (base + chrono::Duration::seconds(secs))
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

fn row(account: &str, kind: &str, secs: i64, eth: f64, decimals: &str) -> String {
    format!(
        "{account},{kind},{},{eth},{},0.002,45000000000,120000,{decimals},0xpool,true",
        ts(secs),
        eth * 1800.0
    )
}

/// 20 ordinary accounts (5 events, gap of i+1 hours), one heavy depositor `0xA`
/// (50 deposits a minute apart) and one single-deposit account `0xB`.
fn population() -> Vec<String> {
    let kinds = ["Deposit", "Borrow", "Repay", "Withdraw", "Deposit"];
    let mut rows = Vec::new();
    for i in 0..20i64 {
        let account = format!("0x{:02}", i);
        for (k, kind) in kinds.iter().enumerate() {
            let eth = 1.0 + (i % 7) as f64 * 0.5 + k as f64 * 0.1;
            let dec = if k % 2 == 0 { "18" } else { "" };
            rows.push(row(&account, kind, k as i64 * (i + 1) * 3600, eth, dec));
        }
    }
    for n in 0..50 {
        rows.push(row("0xA", "Deposit", 86_400 + n * 60, 250.0, "18"));
    }
    rows.push(row("0xB", "Deposit", 172_800, 0.001, ""));
    rows
}

fn table(rows: &[String]) -> RawTable {
    let mut data = String::from(HEADER);
    for r in rows {
        data.push('\n');
        data.push_str(r);
    }
    RawTable::from_reader(data.as_bytes()).unwrap()
}

fn run(rows: &[String]) -> RiskReport {
    RiskPipeline::new(ScoringConfig::default())
        .unwrap()
        .run(&table(rows))
        .unwrap()
}

#[test]
fn config_load_default() {
    let c = ScoringConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.model.contamination, 0.10);
    assert_eq!(c.score.max, 1000.0);
    assert!(c.output.sqlite_path.is_none());
}

#[test]
fn null_value_cells_are_skipped_in_means() {
    let mut rows = population();
    rows.push(format!(
        "0xN,Deposit,{},4,8,0.002,45000000000,120000,,0xpool,true",
        ts(3_600)
    ));
    rows.push(format!(
        "0xN,Deposit,{},,,0.002,45000000000,120000,,0xpool,true",
        ts(7_200)
    ));
    let report = run(&rows);
    assert_eq!(report.matrix.value("0xN", "value_eth_sum"), Some(4.0));
    assert_eq!(report.matrix.value("0xN", "value_eth_mean"), Some(4.0));
    assert_eq!(report.matrix.value("0xN", "value_quote_usd_mean"), Some(8.0));
    assert_eq!(report.matrix.value("0xN", "value_eth_max"), Some(4.0));
}

#[test]
fn scores_are_bounded_and_sorted() {
    let report = run(&population());
    assert_eq!(report.ranked.len(), 22);
    assert!(report.ranked.iter().all(|r| (0.0..=1000.0).contains(&r.score)));
    assert!(report.ranked.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(report.ranked[0].score, 1000.0);
    assert_eq!(report.ranked.last().unwrap().score, 0.0);
    assert!(report.scores.outlier_count() >= 1);
}

#[test]
fn each_account_appears_once() {
    let report = run(&population());
    let mut accounts: Vec<&str> = report.ranked.iter().map(|r| r.account.as_str()).collect();
    accounts.sort();
    accounts.dedup();
    assert_eq!(accounts.len(), report.ranked.len());
    assert_eq!(report.matrix.n_accounts(), 22);
}

#[test]
fn type_counts_sum_to_total() {
    let report = run(&population());
    let m = &report.matrix;
    let total = m.column("total_tx_count").unwrap();
    let count_cols: Vec<usize> = m
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.starts_with("count_"))
        .map(|(j, _)| j)
        .collect();
    assert_eq!(count_cols.len(), 8);
    for i in 0..m.n_accounts() {
        let per_type: f64 = count_cols.iter().map(|&j| m.values[[i, j]]).sum();
        assert_eq!(per_type, total[i], "{}", m.accounts[i]);
    }
    assert_eq!(m.value("0xA", "count_Deposit"), Some(50.0));
    assert_eq!(m.value("0xB", "count_Borrow"), Some(0.0));
}

#[test]
fn single_event_gap_is_population_mean() {
    let report = run(&population());
    let expected = ((1..=20).map(|h| h as f64 * 3600.0).sum::<f64>() + 60.0) / 21.0;
    let gap = report.matrix.value("0xB", "avg_time_gap").unwrap();
    assert!((gap - expected).abs() < 1e-6, "{gap} vs {expected}");
    assert_ne!(gap, 0.0);
    assert_eq!(report.matrix.value("0xA", "avg_time_gap"), Some(60.0));
}

#[test]
fn heavy_and_tiny_accounts_score_differently() {
    let report = run(&population());
    let a = report.get("0xA").unwrap();
    let b = report.get("0xB").unwrap();
    assert!((a.raw_score - b.raw_score).abs() > 1e-6);
    for r in [a, b] {
        assert!((0.0..=1000.0).contains(&r.score));
    }
    let mut scores: Vec<f64> = report.ranked.iter().map(|r| r.score).collect();
    scores.sort_by(|x, y| x.total_cmp(y));
    assert!(a.score > scores[scores.len() / 2]);
}

#[test]
fn identical_input_gives_identical_output() {
    let rows = population();
    let mut first = Vec::new();
    let mut second = Vec::new();
    storage::write_csv(&mut first, &run(&rows).ranked).unwrap();
    storage::write_csv(&mut second, &run(&rows).ranked).unwrap();
    assert_eq!(first, second);
}

#[test]
fn irrelevant_events_do_not_influence_scores() {
    let rows = population();
    let mut noisy = Vec::new();
    for (i, r) in rows.iter().enumerate() {
        noisy.push(r.clone());
        if i % 3 == 0 {
            let account = r.split(',').next().unwrap();
            noisy.push(row(account, "Approval", i as i64 * 17, 9_999.0, "18"));
        }
    }
    noisy.push(row("0xApprover", "Approval", 5, 1.0, ""));
    noisy.push("0xBad,Approval,not-a-time,x,y,z,1,1,,0xpool,true".to_string());

    let clean = run(&rows);
    let dirty = run(&noisy);
    assert_eq!(clean.ranked, dirty.ranked);
    assert!(dirty.get("0xApprover").is_none());
}

#[test]
fn identical_accounts_get_one_constant_score() {
    let mut rows = Vec::new();
    for i in 0..6 {
        let account = format!("0xsame{i}");
        rows.push(row(&account, "Deposit", 0, 1.0, "18"));
        rows.push(row(&account, "Repay", 7200, 1.0, "18"));
    }
    let report = run(&rows);
    assert_eq!(report.ranked.len(), 6);
    assert!(report.ranked.iter().all(|r| r.score == 0.0 && r.score.is_finite()));
    let order: Vec<&str> = report.ranked.iter().map(|r| r.account.as_str()).collect();
    assert_eq!(order, vec!["0xsame0", "0xsame1", "0xsame2", "0xsame3", "0xsame4", "0xsame5"]);
}

#[test]
fn no_relevant_events_is_fatal() {
    let rows = vec![row("0xa", "Approval", 0, 1.0, ""), row("0xb", "Transfer", 0, 1.0, "")];
    let err = RiskPipeline::new(ScoringConfig::default())
        .unwrap()
        .run(&table(&rows))
        .unwrap_err();
    assert!(matches!(err, RiskError::EmptyFilteredSet));
}

#[test]
fn missing_column_is_fatal() {
    let t = RawTable::from_reader("wallet_address,event_name\n0xa,Deposit\n".as_bytes()).unwrap();
    let err = RiskPipeline::new(ScoringConfig::default())
        .unwrap()
        .run(&t)
        .unwrap_err();
    assert!(matches!(err, RiskError::MissingRequiredColumn(_)));
}

#[test]
fn invalid_contamination_is_rejected_up_front() {
    let mut c = ScoringConfig::default();
    c.model.contamination = 1.5;
    assert!(matches!(RiskPipeline::new(c), Err(RiskError::InvalidConfig(_))));
}

#[test]
fn csv_file_roundtrip() {
    let report = run(&population());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Wallet_Risk_Scoring.csv");
    storage::write_csv_path(&path, &report.ranked).unwrap();

    let back = RawTable::from_path(&path).unwrap();
    assert_eq!(back.headers(), &["wallet_address", "risk_score_scaled"]);
    assert_eq!(back.len(), 22);
    assert_eq!(back.rows()[0][0], report.ranked[0].account);
}

#[test]
fn storage_roundtrip() {
    let report = run(&population());
    let dir = tempfile::tempdir().unwrap();
    let mut store = ScoreStore::open(&dir.path().join("scores.db")).unwrap();
    let config = ScoringConfig::default();

    let first = store.insert_run(&report.ranked, &config.model).unwrap();
    let second = store.insert_run(&report.ranked, &config.model).unwrap();
    assert!(second > first);

    let top = &report.ranked[0];
    let stored = store.latest_score(&top.account).unwrap().unwrap();
    assert_eq!(stored.run_id, second);
    assert_eq!(stored.rank, 1);
    assert_eq!(stored.risk_score, top.score);
    assert_eq!(stored.is_outlier, top.is_outlier);
    assert!(store.latest_score("0xnobody").unwrap().is_none());

    assert_eq!(store.prune_before(second).unwrap(), 1);
    assert_eq!(store.latest_score(&top.account).unwrap().unwrap().run_id, second);
}
