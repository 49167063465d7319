//! Replay session: the simulation state machine.
//!
//! A [`Session`] owns the ledger, the day clock, the trade log and the asset
//! history for one playthrough. Each simulated day allows at most one order;
//! [`Session::step`] executes that order and advances the clock in one call.
//! [`Session::settle`] consumes the session, so nothing can mutate it after the
//! report is produced.

use crate::analytics::SettlementReport;
use crate::domain::{Bar, BarSeries, Trade, TradeAction};
use crate::ledger::{Ledger, OrderError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Starting cash of every replay unless configured otherwise.
pub const DEFAULT_INITIAL_CASH: f64 = 1_000_000.0;

/// Board lot: orders must be whole multiples of this many shares.
pub const DEFAULT_LOT_SIZE: u64 = 100;

/// Account parameters fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub initial_cash: f64,
    /// 1 disables lot alignment.
    pub lot_size: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_cash: DEFAULT_INITIAL_CASH,
            lot_size: DEFAULT_LOT_SIZE,
        }
    }
}

/// Errors creating a session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("bar series '{ticker}' is empty")]
    EmptySeries { ticker: String },

    #[error("start index {start_index} is outside the series (len {len})")]
    StartOutOfRange { start_index: usize, len: usize },

    #[error("bar {index} of '{ticker}' has no finite positive close")]
    InvalidBar { ticker: String, index: usize },

    #[error("invalid session config: {0}")]
    InvalidConfig(String),
}

/// What the player does on a simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayAction {
    Buy(u64),
    Sell(u64),
    /// No order, just move to the next day.
    Observe,
}

/// Result of moving the clock forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdvanceResult {
    /// Moved to `day` (days since start) and recorded `total_assets` for it.
    Advanced { day: usize, total_assets: f64 },
    /// Already on the last bar. State is unchanged; the session should settle.
    EndOfData,
}

impl AdvanceResult {
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, AdvanceResult::EndOfData)
    }
}

/// Outcome of a folded order-then-advance step.
#[derive(Debug, Clone, PartialEq)]
pub struct DayOutcome {
    pub trade: Option<Trade>,
    pub advance: AdvanceResult,
}

/// Amount and weight of a prospective order at today's close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderPreview {
    pub volume: u64,
    pub price: f64,
    pub amount: f64,
    /// Order amount as a fraction of current total assets.
    pub share_of_assets: f64,
}

/// State of one playthrough.
#[derive(Debug, Clone)]
pub struct Session {
    series: BarSeries,
    config: SessionConfig,
    start_index: usize,
    current_index: usize,
    ledger: Ledger,
    trade_log: Vec<Trade>,
    assets_history: Vec<f64>,
    order_placed_today: bool,
}

impl Session {
    /// Create a session at `start_index` and record the day-0 asset snapshot.
    pub fn new(
        series: BarSeries,
        start_index: usize,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        if series.is_empty() {
            return Err(SessionError::EmptySeries {
                ticker: series.ticker().to_string(),
            });
        }
        if start_index >= series.len() {
            return Err(SessionError::StartOutOfRange {
                start_index,
                len: series.len(),
            });
        }
        if let Some(index) = series.iter().position(|bar| !bar.is_tradable()) {
            return Err(SessionError::InvalidBar {
                ticker: series.ticker().to_string(),
                index,
            });
        }
        if !(config.initial_cash.is_finite() && config.initial_cash > 0.0) {
            return Err(SessionError::InvalidConfig(format!(
                "initial cash must be positive, got {}",
                config.initial_cash
            )));
        }
        if config.lot_size == 0 {
            return Err(SessionError::InvalidConfig("lot size must be at least 1".into()));
        }

        let ledger = Ledger::new(config.initial_cash);
        let day_zero = ledger.total_assets(series[start_index].close);
        info!(
            ticker = series.ticker(),
            start_index,
            remaining = series.len() - start_index,
            "session created"
        );

        Ok(Self {
            series,
            config,
            start_index,
            current_index: start_index,
            ledger,
            trade_log: Vec::new(),
            assets_history: vec![day_zero],
            order_placed_today: false,
        })
    }

    // ── Order execution ──

    /// Buy `volume` shares at today's close.
    pub fn buy(&mut self, volume: u64) -> Result<Trade, OrderError> {
        self.check_order(volume)?;
        let price = self.current_bar().close;
        self.ledger.buy(volume, price)?;
        Ok(self.record_trade(TradeAction::Buy, price, volume, None))
    }

    /// Sell `volume` shares at today's close.
    pub fn sell(&mut self, volume: u64) -> Result<Trade, OrderError> {
        self.check_order(volume)?;
        let price = self.current_bar().close;
        let profit_rate = self.ledger.sell(volume, price)?;
        Ok(self.record_trade(TradeAction::Sell, price, volume, Some(profit_rate)))
    }

    fn check_order(&self, volume: u64) -> Result<(), OrderError> {
        if self.order_placed_today {
            return Err(OrderError::OrderSlotUsed {
                day: self.day_count(),
            });
        }
        if volume == 0 || volume % self.config.lot_size != 0 {
            return Err(OrderError::InvalidVolume {
                volume,
                lot_size: self.config.lot_size,
            });
        }
        Ok(())
    }

    fn record_trade(
        &mut self,
        action: TradeAction,
        price: f64,
        volume: u64,
        profit_rate: Option<f64>,
    ) -> Trade {
        let trade = Trade {
            day_offset: self.day_count(),
            date: self.current_bar().date,
            action,
            price,
            volume,
            profit_rate,
        };
        debug!(
            day = trade.day_offset,
            %action,
            price,
            volume,
            cash = self.ledger.cash(),
            holdings = self.ledger.holdings(),
            "order executed"
        );
        self.trade_log.push(trade.clone());
        self.order_placed_today = true;
        trade
    }

    // ── Clock ──

    /// Move to the next bar and record its total assets.
    pub fn advance_day(&mut self) -> AdvanceResult {
        if self.is_last_day() {
            return AdvanceResult::EndOfData;
        }
        self.current_index += 1;
        self.order_placed_today = false;

        let total_assets = self.total_assets();
        self.assets_history.push(total_assets);
        let day = self.day_count();
        debug!(day, total_assets, "advanced");
        AdvanceResult::Advanced { day, total_assets }
    }

    /// Execute the day's action, then advance. A rejected order does not
    /// advance the clock, so the player can retry the same day.
    pub fn step(&mut self, action: DayAction) -> Result<DayOutcome, OrderError> {
        let trade = match action {
            DayAction::Buy(volume) => Some(self.buy(volume)?),
            DayAction::Sell(volume) => Some(self.sell(volume)?),
            DayAction::Observe => None,
        };
        let advance = self.advance_day();
        Ok(DayOutcome { trade, advance })
    }

    /// End the playthrough and compute the report.
    pub fn settle(self) -> SettlementReport {
        let report = SettlementReport::compute(
            self.series.ticker(),
            self.config.initial_cash,
            &self.assets_history,
            &self.trade_log,
            self.day_count(),
        );
        info!(
            ticker = %report.ticker,
            final_assets = report.final_assets,
            total_return_rate = report.total_return_rate,
            max_drawdown = report.max_drawdown,
            total_days = report.total_days,
            "session settled"
        );
        report
    }

    // ── Queries ──

    pub fn ticker(&self) -> &str {
        self.series.ticker()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Completed advances since the start bar.
    pub fn day_count(&self) -> usize {
        self.current_index - self.start_index
    }

    /// Days left before end of data.
    pub fn remaining_days(&self) -> usize {
        self.series.len() - 1 - self.current_index
    }

    pub fn is_last_day(&self) -> bool {
        self.current_index + 1 >= self.series.len()
    }

    /// Whether today's single order has been used.
    pub fn order_placed_today(&self) -> bool {
        self.order_placed_today
    }

    pub fn current_bar(&self) -> &Bar {
        &self.series[self.current_index]
    }

    /// Bars up to and including today; later bars stay hidden from the player.
    pub fn visible_bars(&self) -> &[Bar] {
        &self.series[..=self.current_index]
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn cash(&self) -> f64 {
        self.ledger.cash()
    }

    pub fn holdings(&self) -> u64 {
        self.ledger.holdings()
    }

    pub fn avg_cost(&self) -> f64 {
        self.ledger.avg_cost()
    }

    pub fn market_value(&self) -> f64 {
        self.ledger.market_value(self.current_bar().close)
    }

    pub fn total_assets(&self) -> f64 {
        self.ledger.total_assets(self.current_bar().close)
    }

    /// Cumulative return against the initial cash.
    pub fn total_return_rate(&self) -> f64 {
        crate::analytics::total_return_rate(self.total_assets(), self.config.initial_cash)
    }

    /// Position market value as a fraction of total assets.
    pub fn position_ratio(&self) -> f64 {
        let total = self.total_assets();
        if total <= 0.0 {
            return 0.0;
        }
        self.market_value() / total
    }

    pub fn unrealized_return(&self) -> f64 {
        self.ledger.unrealized_return(self.current_bar().close)
    }

    /// What an order of `volume` shares would cost today.
    pub fn order_preview(&self, volume: u64) -> OrderPreview {
        let price = self.current_bar().close;
        let amount = volume as f64 * price;
        let total = self.total_assets();
        OrderPreview {
            volume,
            price,
            amount,
            share_of_assets: if total > 0.0 { amount / total } else { 0.0 },
        }
    }

    /// Largest lot-aligned volume the current cash can buy.
    pub fn max_affordable_volume(&self) -> u64 {
        let price = self.current_bar().close;
        if price <= 0.0 {
            return 0;
        }
        let shares = (self.ledger.cash() / price).floor() as u64;
        shares - shares % self.config.lot_size
    }

    pub fn trade_log(&self) -> &[Trade] {
        &self.trade_log
    }

    pub fn assets_history(&self) -> &[f64] {
        &self.assets_history
    }
}
