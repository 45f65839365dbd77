//! Relevant-type selection: raw table → typed events.

use super::{parse_timestamp, Event, RawTable};
use crate::config::{ColumnsConfig, EventsConfig};
use crate::error::{Result, RiskError};
use std::collections::HashSet;

/// Cell spellings read as null, alongside the empty cell.
const NULL_TOKENS: [&str; 5] = ["nan", "null", "none", "na", "n/a"];

fn is_null(cell: &str) -> bool {
    let c = cell.trim();
    c.is_empty() || NULL_TOKENS.iter().any(|t| c.eq_ignore_ascii_case(t))
}

/// Column positions resolved once per table.
struct ColumnIndex {
    account: usize,
    event_type: usize,
    timestamp: usize,
    value_base: usize,
    value_quote: usize,
    fee: usize,
    gas_price: usize,
    gas_spent: usize,
    decimals: usize,
}

impl ColumnIndex {
    fn resolve(table: &RawTable, cols: &ColumnsConfig) -> Result<Self> {
        let idx = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| RiskError::MissingRequiredColumn(name.to_string()))
        };
        Ok(Self {
            account: idx(&cols.account)?,
            event_type: idx(&cols.event_type)?,
            timestamp: idx(&cols.timestamp)?,
            value_base: idx(&cols.value_base)?,
            value_quote: idx(&cols.value_quote)?,
            fee: idx(&cols.fee)?,
            gas_price: idx(&cols.gas_price)?,
            gas_spent: idx(&cols.gas_spent)?,
            decimals: idx(&cols.decimals)?,
        })
    }
}

pub struct EventFilter {
    relevant: HashSet<String>,
    columns: ColumnsConfig,
}

impl EventFilter {
    pub fn new(config: &EventsConfig) -> Self {
        Self {
            relevant: config.relevant_types.iter().cloned().collect(),
            columns: config.columns.clone(),
        }
    }

    pub fn is_relevant(&self, event_type: &str) -> bool {
        self.relevant.contains(event_type)
    }

    /// Keep rows whose event type is relevant and parse them into events.
    ///
    /// Every contract column must be present in the header, even if no row survives;
    /// this check runs before any row is looked at. Rows of other types are dropped
    /// unparsed, so a bad timestamp on an irrelevant row never aborts the run.
    pub fn filter(&self, table: &RawTable) -> Result<Vec<Event>> {
        let ix = ColumnIndex::resolve(table, &self.columns)?;
        let mut out = Vec::new();

        for (row_no, row) in table.rows().iter().enumerate() {
            let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
            // Exact match, no trimming or case folding.
            let event_type = cell(ix.event_type);
            if !self.is_relevant(event_type) {
                continue;
            }

            let raw_ts = cell(ix.timestamp);
            let ts = parse_timestamp(raw_ts).ok_or_else(|| RiskError::MalformedTimestamp {
                row: row_no,
                value: raw_ts.to_string(),
            })?;
            let number = |i: usize, column: &str| parse_number(row_no, column, cell(i));

            out.push(Event {
                account: cell(ix.account).to_string(),
                event_type: event_type.to_string(),
                ts,
                value_base: number(ix.value_base, self.columns.value_base.as_str())?,
                value_quote: number(ix.value_quote, self.columns.value_quote.as_str())?,
                fee: number(ix.fee, self.columns.fee.as_str())?,
                gas_price: number(ix.gas_price, self.columns.gas_price.as_str())?,
                gas_spent: number(ix.gas_spent, self.columns.gas_spent.as_str())?,
                has_decimals: !is_null(cell(ix.decimals)),
            });
        }

        tracing::info!(
            rows = table.len(),
            kept = out.len(),
            dropped = table.len() - out.len(),
            "events filtered"
        );
        Ok(out)
    }
}

/// Null cells are missing; anything else must be a finite float.
fn parse_number(row: usize, column: &str, cell: &str) -> Result<Option<f64>> {
    if is_null(cell) {
        return Ok(None);
    }
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(RiskError::MalformedValue {
            row,
            column: column.to_string(),
            value: cell.to_string(),
        }),
    }
}
