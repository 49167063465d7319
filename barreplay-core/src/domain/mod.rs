//! Domain types for BarReplay

pub mod bar;
pub mod trade;

pub use bar::{Bar, BarSeries};
pub use trade::{day_label, Trade, TradeAction};
