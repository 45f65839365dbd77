//! Per-account grouping reductions over filtered events. Each function is independent and pure.

use super::FeatureFrame;
use crate::events::Event;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const TOTAL_TX_COUNT: &str = "total_tx_count";
pub const AVG_TIME_GAP: &str = "avg_time_gap";

/// Count column name for an event type
pub fn count_column(event_type: &str) -> String {
    format!("count_{event_type}")
}

fn by_account(events: &[Event]) -> BTreeMap<&str, Vec<&Event>> {
    let mut groups: BTreeMap<&str, Vec<&Event>> = BTreeMap::new();
    for e in events {
        groups.entry(e.account.as_str()).or_default().push(e);
    }
    groups
}

/// (sum, mean, max) over the present values only. With nothing present the sum
/// is 0 and mean/max are missing.
fn sum_mean_max(values: impl Iterator<Item = Option<f64>>) -> (f64, Option<f64>, Option<f64>) {
    let (mut sum, mut n, mut max) = (0.0, 0usize, f64::NEG_INFINITY);
    for v in values.flatten() {
        sum += v;
        n += 1;
        max = max.max(v);
    }
    if n == 0 {
        return (sum, None, None);
    }
    (sum, Some(sum / n as f64), Some(max))
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    sum_mean_max(values).1
}

/// Total events per account plus one count column per relevant type, zero when never seen.
pub fn activity_counts(events: &[Event], relevant_types: &[String]) -> FeatureFrame {
    let mut columns = vec![TOTAL_TX_COUNT.to_string()];
    columns.extend(relevant_types.iter().map(|t| count_column(t)));
    let mut frame = FeatureFrame::new(columns);

    for (account, group) in by_account(events) {
        let mut row = vec![Some(0.0); relevant_types.len() + 1];
        row[0] = Some(group.len() as f64);
        for e in group {
            if let Some(i) = relevant_types.iter().position(|t| *t == e.event_type) {
                row[i + 1] = row[i + 1].map(|c| c + 1.0);
            }
        }
        frame.rows.insert(account.to_string(), row);
    }
    frame
}

/// Sum, mean and max of the base-unit and quote-currency values.
pub fn volume_stats(events: &[Event]) -> FeatureFrame {
    let mut frame = FeatureFrame::new(
        [
            "value_eth_sum",
            "value_eth_mean",
            "value_eth_max",
            "value_quote_usd_sum",
            "value_quote_usd_mean",
            "value_quote_usd_max",
        ]
        .map(String::from)
        .to_vec(),
    );
    for (account, group) in by_account(events) {
        let (bs, bm, bx) = sum_mean_max(group.iter().map(|e| e.value_base));
        let (qs, qm, qx) = sum_mean_max(group.iter().map(|e| e.value_quote));
        frame.rows.insert(
            account.to_string(),
            vec![Some(bs), bm, bx, Some(qs), qm, qx],
        );
    }
    frame
}

/// Fee sum and mean, mean gas price, mean gas consumed.
pub fn fee_gas_stats(events: &[Event]) -> FeatureFrame {
    let mut frame = FeatureFrame::new(
        [
            "fees_paid_eth_sum",
            "fees_paid_eth_mean",
            "gas_price_mean",
            "gas_spent_mean",
        ]
        .map(String::from)
        .to_vec(),
    );
    for (account, group) in by_account(events) {
        let (fs, fm, _) = sum_mean_max(group.iter().map(|e| e.fee));
        let gp = mean(group.iter().map(|e| e.gas_price));
        let gs = mean(group.iter().map(|e| e.gas_spent));
        frame
            .rows
            .insert(account.to_string(), vec![Some(fs), fm, gp, gs]);
    }
    frame
}

/// First and last event time of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemporalStats {
    /// `active_days`, `account_age_days`
    pub frame: FeatureFrame,
    pub spans: BTreeMap<String, TimeSpan>,
}

/// Active calendar days (UTC) and age in whole days between first and last event.
pub fn temporal_stats(events: &[Event]) -> TemporalStats {
    let mut stats = TemporalStats {
        frame: FeatureFrame::new(vec!["active_days".into(), "account_age_days".into()]),
        spans: BTreeMap::new(),
    };
    for (account, group) in by_account(events) {
        let Some(first) = group.iter().map(|e| e.ts).min() else {
            continue;
        };
        let last = group.iter().map(|e| e.ts).max().unwrap_or(first);
        let days: HashSet<NaiveDate> = group.iter().map(|e| e.ts.date_naive()).collect();
        let age = (last - first).num_days();
        stats
            .frame
            .rows
            .insert(account.to_string(), vec![Some(days.len() as f64), Some(age as f64)]);
        stats.spans.insert(account.to_string(), TimeSpan { first, last });
    }
    stats
}

/// Mean seconds between consecutive events in time order. Missing for single-event accounts.
pub fn inter_event_gap(events: &[Event]) -> FeatureFrame {
    let mut frame = FeatureFrame::new(vec![AVG_TIME_GAP.to_string()]);
    for (account, group) in by_account(events) {
        let mut times: Vec<DateTime<Utc>> = group.iter().map(|e| e.ts).collect();
        times.sort();
        let gap = if times.len() < 2 {
            None
        } else {
            let total: f64 = times
                .windows(2)
                .map(|w| (w[1] - w[0]).to_std().map(|d| d.as_secs_f64()).unwrap_or(0.0))
                .sum();
            Some(total / (times.len() - 1) as f64)
        };
        frame.rows.insert(account.to_string(), vec![gap]);
    }
    frame
}

/// Fraction of an account's events carrying decimals metadata.
pub fn decimals_presence(events: &[Event]) -> FeatureFrame {
    let mut frame = FeatureFrame::new(vec!["decimals_presence".into()]);
    for (account, group) in by_account(events) {
        let present = group.iter().filter(|e| e.has_decimals).count();
        frame.rows.insert(
            account.to_string(),
            vec![Some(present as f64 / group.len() as f64)],
        );
    }
    frame
}
