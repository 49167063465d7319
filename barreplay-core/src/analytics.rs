//! Settlement analytics: pure functions over the asset history and trade log.
//!
//! Every metric is total: empty or degenerate inputs return 0.0, because a
//! replay that never trades is a valid outcome.

use crate::domain::Trade;
use serde::{Deserialize, Serialize};

/// Which side of the realized results to average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateKind {
    /// Sells with a profit rate above zero.
    Win,
    /// Sells with a profit rate at or below zero.
    Loss,
}

impl RateKind {
    fn matches(self, profit_rate: f64) -> bool {
        match self {
            RateKind::Win => profit_rate > 0.0,
            RateKind::Loss => profit_rate <= 0.0,
        }
    }
}

/// Final performance report of one playthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub ticker: String,
    pub initial_cash: f64,
    pub final_assets: f64,
    pub total_return_rate: f64,
    /// Positive fraction: 0.15 is a 15% decline from the running peak.
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub avg_win_rate: f64,
    pub avg_loss_rate: f64,
    /// Number of sell trades (closed decisions).
    pub total_trades: usize,
    pub buy_count: usize,
    pub total_days: usize,
    pub assets_history: Vec<f64>,
    pub trade_log: Vec<Trade>,
}

impl SettlementReport {
    /// Compute the report from the final session data.
    pub fn compute(
        ticker: &str,
        initial_cash: f64,
        assets_history: &[f64],
        trades: &[Trade],
        total_days: usize,
    ) -> Self {
        let final_assets = assets_history.last().copied().unwrap_or(initial_cash);
        let sells = sell_count(trades);
        Self {
            ticker: ticker.to_string(),
            initial_cash,
            final_assets,
            total_return_rate: total_return_rate(final_assets, initial_cash),
            max_drawdown: max_drawdown(assets_history),
            win_rate: win_rate(trades),
            avg_win_rate: avg_rate(trades, RateKind::Win),
            avg_loss_rate: avg_rate(trades, RateKind::Loss),
            total_trades: sells,
            buy_count: trades.len() - sells,
            total_days,
            assets_history: assets_history.to_vec(),
            trade_log: trades.to_vec(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return_rate(final_assets: f64, initial_cash: f64) -> f64 {
    if initial_cash <= 0.0 {
        return 0.0;
    }
    (final_assets - initial_cash) / initial_cash
}

/// Maximum drawdown as a positive fraction of the running peak.
///
/// Returns 0.0 for fewer than two points or a non-declining series.
pub fn max_drawdown(history: &[f64]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let mut peak = history[0];
    let mut max_dd = 0.0_f64;

    for &value in &history[1..] {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Fraction of sell trades with a positive profit rate.
pub fn win_rate(trades: &[Trade]) -> f64 {
    let sells = sell_count(trades);
    if sells == 0 {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / sells as f64
}

/// Mean profit rate over the sell trades of the given kind.
pub fn avg_rate(trades: &[Trade], kind: RateKind) -> f64 {
    let rates: Vec<f64> = sell_rates(trades).filter(|&r| kind.matches(r)).collect();
    mean_f64(&rates)
}

/// Number of sell trades.
pub fn sell_count(trades: &[Trade]) -> usize {
    trades.iter().filter(|t| t.is_sell()).count()
}

// ─── Helpers ────────────────────────────────────────────────────────

fn sell_rates(trades: &[Trade]) -> impl Iterator<Item = f64> + '_ {
    trades.iter().filter(|t| t.is_sell()).filter_map(|t| t.profit_rate)
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
