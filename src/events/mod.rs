//! Event intake: raw tabular rows, timestamp parsing, relevant-type filtering.
//! Only the contract columns survive into [`Event`]; everything else in the export is ignored.

mod filter;
mod table;
mod timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use filter::EventFilter;
pub use table::RawTable;
pub use timestamp::parse_timestamp;

/// One filtered lending event attributed to an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Grouping key, kept exactly as it appears in the input (case-sensitive)
    pub account: String,
    pub event_type: String,
    pub ts: DateTime<Utc>,
    /// Value in the chain's base unit (ETH); `None` for a null cell
    pub value_base: Option<f64>,
    /// Value in the quote currency (USD)
    pub value_quote: Option<f64>,
    pub fee: Option<f64>,
    pub gas_price: Option<f64>,
    pub gas_spent: Option<f64>,
    /// Whether the decimals metadata cell was non-null
    pub has_decimals: bool,
}
