//! BarReplay Core: replay engine, domain types, settlement analytics, market data.
//!
//! This crate contains the heart of the bar-replay trainer:
//! - Domain types (bars, bar series, trades)
//! - Ledger with weighted-average cost basis
//! - Replay session: one order per day, day clock, asset history
//! - Settlement analytics (total return, max drawdown, win rate, average win/loss)
//! - Market data sources and eligibility-filtered random game selection

pub mod analytics;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod ledger;
pub mod session;

pub use analytics::{RateKind, SettlementReport};
pub use domain::{Bar, BarSeries, Trade, TradeAction};
pub use ledger::{Ledger, OrderError};
pub use session::{
    AdvanceResult, DayAction, DayOutcome, OrderPreview, Session, SessionConfig, SessionError,
};
