//! Trade: one executed order in the replay trade log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an executed order. Only long positions exist in a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

/// An executed order. Immutable once appended to the trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Bar index at execution time minus the session start index.
    pub day_offset: usize,
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub volume: u64,
    /// `(price - avg_cost) / avg_cost` against the cost basis before the sale.
    /// Only present on sells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_rate: Option<f64>,
}

impl Trade {
    /// Cash moved by this trade (always positive).
    pub fn amount(&self) -> f64 {
        self.price * self.volume as f64
    }

    pub fn is_sell(&self) -> bool {
        self.action == TradeAction::Sell
    }

    /// A sell that realized a gain. Buys are never winners.
    pub fn is_winner(&self) -> bool {
        self.is_sell() && self.profit_rate.is_some_and(|r| r > 0.0)
    }

    pub fn day_label(&self) -> String {
        day_label(self.day_offset as i64)
    }
}

/// Label for a bar relative to the session start: `"Start"`, `"T+3"`, `"T-12"`.
pub fn day_label(offset: i64) -> String {
    match offset {
        0 => "Start".to_string(),
        n if n > 0 => format!("T+{n}"),
        n => format!("T{n}"),
    }
}
