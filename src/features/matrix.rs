//! Feature matrix assembly: outer-join the per-group frames on account and apply the
//! per-column missing-value policy.

use super::aggregate::{self, count_column, TimeSpan, AVG_TIME_GAP, TOTAL_TX_COUNT};
use super::FeatureFrame;
use crate::config::EventsConfig;
use crate::error::{Result, RiskError};
use crate::events::Event;
use ndarray::{Array2, ArrayView1};
use std::collections::{BTreeMap, BTreeSet};

/// How a missing cell is resolved after the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPolicy {
    /// Counts: an account absent from a group never did the thing
    ZeroFill,
    /// Replace with the mean of the column's present values
    MeanImpute,
    /// Must be present for every account; a gap is an error
    Required,
}

/// The policy for every column of the matrix, in matrix order.
///
/// Sums are always defined (0 over null cells). Means and maxima are missing only when
/// every cell of an account is null, and then count as 0 like an account with no flow.
pub fn column_policies(relevant_types: &[String]) -> Vec<(String, ColumnPolicy)> {
    use ColumnPolicy::*;
    let mut table = vec![(TOTAL_TX_COUNT.to_string(), ZeroFill)];
    table.extend(relevant_types.iter().map(|t| (count_column(t), ZeroFill)));
    for (name, policy) in [
        ("value_eth_sum", Required),
        ("value_eth_mean", ZeroFill),
        ("value_eth_max", ZeroFill),
        ("value_quote_usd_sum", Required),
        ("value_quote_usd_mean", ZeroFill),
        ("value_quote_usd_max", ZeroFill),
        ("fees_paid_eth_sum", Required),
        ("fees_paid_eth_mean", ZeroFill),
        ("gas_price_mean", ZeroFill),
        ("gas_spent_mean", ZeroFill),
        ("active_days", Required),
        ("account_age_days", Required),
    ] {
        table.push((name.to_string(), policy));
    }
    table.push((AVG_TIME_GAP.to_string(), MeanImpute));
    table.push(("decimals_presence".to_string(), Required));
    table
}

/// Numeric features, one row per account, plus the non-numeric columns kept for output.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    /// Sorted ascending; row `i` of `values` belongs to `accounts[i]`
    pub accounts: Vec<String>,
    pub spans: Vec<Option<TimeSpan>>,
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    /// Outer-join `frames` on account and resolve missing cells through `policies`.
    /// Columns without an entry in `policies` are treated as `Required`.
    pub fn assemble(
        frames: &[FeatureFrame],
        spans: &BTreeMap<String, TimeSpan>,
        policies: &[(String, ColumnPolicy)],
    ) -> Result<Self> {
        let accounts: Vec<String> = frames
            .iter()
            .flat_map(|f| f.rows.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if accounts.is_empty() {
            return Err(RiskError::EmptyFilteredSet);
        }

        let columns: Vec<String> = frames.iter().flat_map(|f| f.columns.iter().cloned()).collect();
        let mut cells: Vec<Vec<Option<f64>>> = Vec::with_capacity(accounts.len());
        for account in &accounts {
            let mut row = Vec::with_capacity(columns.len());
            for frame in frames {
                match frame.rows.get(account) {
                    Some(r) => row.extend(r.iter().copied()),
                    None => row.extend(std::iter::repeat(None).take(frame.columns.len())),
                }
            }
            cells.push(row);
        }

        let mut values = Array2::<f64>::zeros((accounts.len(), columns.len()));
        for (j, column) in columns.iter().enumerate() {
            let policy = policies
                .iter()
                .find(|(c, _)| c == column)
                .map(|(_, p)| *p)
                .unwrap_or(ColumnPolicy::Required);
            let fill = match policy {
                ColumnPolicy::ZeroFill => 0.0,
                ColumnPolicy::MeanImpute => {
                    let present: Vec<f64> = cells.iter().filter_map(|r| r[j]).collect();
                    if present.is_empty() {
                        // Column is constant either way; the model cannot split on it.
                        tracing::warn!(column = %column, "no values to impute from; filling 0");
                        0.0
                    } else {
                        present.iter().sum::<f64>() / present.len() as f64
                    }
                }
                ColumnPolicy::Required => f64::NAN,
            };
            let mut imputed = 0usize;
            for (i, row) in cells.iter().enumerate() {
                values[[i, j]] = match row[j] {
                    Some(v) => v,
                    None if policy == ColumnPolicy::Required => {
                        return Err(RiskError::MissingFeature {
                            account: accounts[i].clone(),
                            column: column.clone(),
                        })
                    }
                    None => {
                        imputed += 1;
                        fill
                    }
                };
            }
            if imputed > 0 {
                tracing::debug!(column = %column, ?policy, imputed, fill, "missing cells filled");
            }
        }

        let spans = accounts.iter().map(|a| spans.get(a).copied()).collect();
        Ok(Self {
            accounts,
            spans,
            columns,
            values,
        })
    }

    pub fn n_accounts(&self) -> usize {
        self.accounts.len()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    pub fn row_of(&self, account: &str) -> Option<usize> {
        self.accounts.binary_search_by(|a| a.as_str().cmp(account)).ok()
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let j = self.columns.iter().position(|c| c == name)?;
        Some(self.values.column(j))
    }

    pub fn value(&self, account: &str, column: &str) -> Option<f64> {
        let i = self.row_of(account)?;
        self.column(column).map(|c| c[i])
    }
}

/// Pipeline that runs: filtered events → feature groups → matrix
pub struct FeatureExtractor {
    relevant_types: Vec<String>,
    policies: Vec<(String, ColumnPolicy)>,
}

impl FeatureExtractor {
    pub fn new(config: &EventsConfig) -> Self {
        Self {
            relevant_types: config.relevant_types.clone(),
            policies: column_policies(&config.relevant_types),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.policies.len()
    }

    pub fn extract(&self, events: &[Event]) -> Result<FeatureMatrix> {
        if events.is_empty() {
            return Err(RiskError::EmptyFilteredSet);
        }
        let temporal = aggregate::temporal_stats(events);
        let frames = [
            aggregate::activity_counts(events, &self.relevant_types),
            aggregate::volume_stats(events),
            aggregate::fee_gas_stats(events),
            temporal.frame,
            aggregate::inter_event_gap(events),
            aggregate::decimals_presence(events),
        ];
        let matrix = FeatureMatrix::assemble(&frames, &temporal.spans, &self.policies)?;
        tracing::info!(
            accounts = matrix.n_accounts(),
            features = matrix.n_features(),
            "feature matrix assembled"
        );
        Ok(matrix)
    }
}
