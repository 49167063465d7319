//! Ledger: cash, share holdings and weighted-average cost basis.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons an order is rejected. A rejected order never mutates any state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("insufficient funds: order costs {required:.2}, cash available {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient holdings: tried to sell {requested} shares, holding {held}")]
    InsufficientHoldings { requested: u64, held: u64 },

    #[error("invalid volume {volume}: must be a positive multiple of {lot_size}")]
    InvalidVolume { volume: u64, lot_size: u64 },

    #[error("an order was already placed on day {day}; advance before trading again")]
    OrderSlotUsed { day: usize },

    #[error("cannot trade at price {price}")]
    InvalidPrice { price: f64 },
}

/// Account state for a single-security replay.
///
/// Invariants held after every call:
/// - `cash >= 0`
/// - `avg_cost == 0` exactly when `holdings == 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    cash: f64,
    holdings: u64,
    avg_cost: f64,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            holdings: 0,
            avg_cost: 0.0,
        }
    }

    /// Buy `volume` shares at `price`, folding them into the weighted average cost.
    pub fn buy(&mut self, volume: u64, price: f64) -> Result<(), OrderError> {
        check_price(price)?;
        let trade_amount = volume as f64 * price;
        if !trade_amount.is_finite() || trade_amount > self.cash {
            return Err(OrderError::InsufficientFunds {
                required: trade_amount,
                available: self.cash,
            });
        }

        let held = self.holdings as f64;
        self.avg_cost = (held * self.avg_cost + trade_amount) / (held + volume as f64);
        self.cash -= trade_amount;
        self.holdings += volume;
        Ok(())
    }

    /// Sell `volume` shares at `price`. Returns the realized profit rate measured
    /// against the cost basis before the sale.
    pub fn sell(&mut self, volume: u64, price: f64) -> Result<f64, OrderError> {
        check_price(price)?;
        if volume > self.holdings {
            return Err(OrderError::InsufficientHoldings {
                requested: volume,
                held: self.holdings,
            });
        }

        // holdings > 0 here, and buys only happen at positive prices, so avg_cost > 0
        let profit_rate = (price - self.avg_cost) / self.avg_cost;
        self.cash += volume as f64 * price;
        self.holdings -= volume;
        if self.holdings == 0 {
            self.avg_cost = 0.0;
        }
        Ok(profit_rate)
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn holdings(&self) -> u64 {
        self.holdings
    }

    pub fn avg_cost(&self) -> f64 {
        self.avg_cost
    }

    pub fn is_flat(&self) -> bool {
        self.holdings == 0
    }

    /// Market value of the open position at `price`.
    pub fn market_value(&self, price: f64) -> f64 {
        self.holdings as f64 * price
    }

    /// Total assets = cash + position market value.
    pub fn total_assets(&self, price: f64) -> f64 {
        self.cash + self.market_value(price)
    }

    /// Unrealized return of the open position as a fraction of cost. 0 when flat.
    pub fn unrealized_return(&self, price: f64) -> f64 {
        if self.is_flat() || self.avg_cost <= 0.0 {
            return 0.0;
        }
        (price - self.avg_cost) / self.avg_cost
    }
}

fn check_price(price: f64) -> Result<(), OrderError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(OrderError::InvalidPrice { price })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_debits_cash_and_sets_cost() {
        let mut ledger = Ledger::new(1_000_000.0);
        ledger.buy(100, 10.0).unwrap();
        assert_eq!(ledger.cash(), 999_000.0);
        assert_eq!(ledger.holdings(), 100);
        assert_eq!(ledger.avg_cost(), 10.0);
    }

    #[test]
    fn buy_weighted_average() {
        let mut ledger = Ledger::new(1_000_000.0);
        ledger.buy(100, 10.0).unwrap();
        ledger.buy(300, 14.0).unwrap();
        // (100*10 + 300*14) / 400 = 13.0
        assert!((ledger.avg_cost() - 13.0).abs() < 1e-10);
        assert_eq!(ledger.holdings(), 400);
    }

    #[test]
    fn buy_rejects_overspend_without_mutation() {
        let mut ledger = Ledger::new(500.0);
        let before = ledger.clone();
        let err = ledger.buy(100, 10.0).unwrap_err();
        assert_eq!(
            err,
            OrderError::InsufficientFunds {
                required: 1_000.0,
                available: 500.0
            }
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn buy_rejects_nan_and_zero_price_without_mutation() {
        let mut ledger = Ledger::new(1_000_000.0);
        let before = ledger.clone();
        assert!(matches!(
            ledger.buy(100, f64::NAN),
            Err(OrderError::InvalidPrice { .. })
        ));
        assert_eq!(ledger.buy(100, 0.0), Err(OrderError::InvalidPrice { price: 0.0 }));
        assert_eq!(ledger, before);
        assert!(ledger.cash() >= 0.0);
    }

    #[test]
    fn buy_rejects_overflowing_amount() {
        let mut ledger = Ledger::new(1_000_000.0);
        let err = ledger.buy(u64::MAX, f64::MAX).unwrap_err();
        assert!(matches!(err, OrderError::InsufficientFunds { .. }));
        assert!(ledger.is_flat());
    }

    #[test]
    fn sell_rejects_nan_price() {
        let mut ledger = Ledger::new(1_000_000.0);
        ledger.buy(100, 10.0).unwrap();
        let before = ledger.clone();
        assert!(ledger.sell(100, f64::NAN).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn buy_exactly_all_cash_is_allowed() {
        let mut ledger = Ledger::new(1_000.0);
        ledger.buy(100, 10.0).unwrap();
        assert_eq!(ledger.cash(), 0.0);
    }

    #[test]
    fn sell_returns_profit_rate_against_pre_sale_cost() {
        let mut ledger = Ledger::new(1_000_000.0);
        ledger.buy(200, 10.0).unwrap();
        let rate = ledger.sell(100, 12.0).unwrap();
        assert!((rate - 0.2).abs() < 1e-10);
        // partial sale keeps the cost basis
        assert_eq!(ledger.avg_cost(), 10.0);
        assert_eq!(ledger.holdings(), 100);
    }

    #[test]
    fn sell_to_flat_resets_cost() {
        let mut ledger = Ledger::new(1_000_000.0);
        ledger.buy(100, 10.0).unwrap();
        ledger.sell(100, 9.0).unwrap();
        assert!(ledger.is_flat());
        assert_eq!(ledger.avg_cost(), 0.0);
        assert_eq!(ledger.cash(), 999_900.0);
    }

    #[test]
    fn sell_rejects_oversell_without_mutation() {
        let mut ledger = Ledger::new(1_000_000.0);
        ledger.buy(100, 10.0).unwrap();
        let before = ledger.clone();
        let err = ledger.sell(200, 11.0).unwrap_err();
        assert_eq!(
            err,
            OrderError::InsufficientHoldings {
                requested: 200,
                held: 100
            }
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn total_assets_marks_to_price() {
        let mut ledger = Ledger::new(1_000_000.0);
        ledger.buy(100, 10.0).unwrap();
        assert_eq!(ledger.total_assets(12.0), 1_000_200.0);
        assert_eq!(ledger.market_value(12.0), 1_200.0);
        assert!((ledger.unrealized_return(12.0) - 0.2).abs() < 1e-10);
    }

    #[test]
    fn unrealized_return_is_zero_when_flat() {
        let ledger = Ledger::new(1_000_000.0);
        assert_eq!(ledger.unrealized_return(12.0), 0.0);
    }
}
