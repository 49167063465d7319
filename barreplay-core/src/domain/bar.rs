//! Bar: one trading day of price and valuation data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

/// Daily bar for a single security.
///
/// Prices are in the security's quote currency. The valuation fields
/// (`turnover_rate`, `pe`, `pb`) are often missing for young listings and are
/// therefore optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub turnover_rate: Option<f64>,
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    /// Close-to-close change in percent (2.5 means +2.5%).
    pub change_pct: f64,
}

impl Bar {
    /// A bar can be traded on when its close is finite and positive.
    pub fn is_tradable(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Immutable, cheaply clonable bar series for one security.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    ticker: String,
    bars: Arc<[Bar]>,
}

impl BarSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            ticker: ticker.into(),
            bars: bars.into(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }
}

impl Deref for BarSeries {
    type Target = [Bar];

    fn deref(&self) -> &[Bar] {
        &self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 10.0,
            high: 10.5,
            low: 9.8,
            close: 10.3,
            volume: 50_000,
            turnover_rate: Some(1.2),
            pe: Some(15.0),
            pb: None,
            change_pct: 3.0,
        }
    }

    #[test]
    fn bar_is_tradable() {
        assert!(sample_bar().is_tradable());
    }

    #[test]
    fn nan_or_infinite_close_is_not_tradable() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(!bar.is_tradable());
        bar.close = f64::INFINITY;
        assert!(!bar.is_tradable());
    }

    #[test]
    fn non_positive_close_is_not_tradable() {
        let mut bar = sample_bar();
        bar.close = 0.0;
        assert!(!bar.is_tradable());
        bar.close = -1.0;
        assert!(!bar.is_tradable());
    }

    #[test]
    fn series_exposes_slice() {
        let series = BarSeries::new("000001", vec![sample_bar(), sample_bar()]);
        assert_eq!(series.ticker(), "000001");
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].close, 10.3);
        assert!(BarSeries::new("EMPTY", Vec::new()).is_empty());
    }

    #[test]
    fn series_clone_shares_bars() {
        let series = BarSeries::new("000001", vec![sample_bar()]);
        let clone = series.clone();
        assert!(std::ptr::eq(series.bars().as_ptr(), clone.bars().as_ptr()));
    }
}
