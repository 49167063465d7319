//! Moving averages of closing prices for the replay status panel.
//!
//! Only bars up to the current day are ever passed in, so these cannot look
//! ahead.

use crate::domain::Bar;

/// Moving-average periods shown alongside the price.
pub const MA_PERIODS: [usize; 4] = [10, 20, 60, 250];

/// Simple moving average of closes over the `period` bars ending at `index`.
///
/// Returns `None` while fewer than `period` bars are available, for a zero
/// period, or when `index` is out of range.
pub fn sma(bars: &[Bar], index: usize, period: usize) -> Option<f64> {
    if period == 0 || index >= bars.len() || index + 1 < period {
        return None;
    }
    let window = &bars[index + 1 - period..=index];
    let sum: f64 = window.iter().map(|b| b.close).sum();
    Some(sum / period as f64)
}

/// SMA of the last bar for every period in [`MA_PERIODS`].
pub fn latest_averages(bars: &[Bar]) -> Vec<(usize, Option<f64>)> {
    let Some(last) = bars.len().checked_sub(1) else {
        return MA_PERIODS.iter().map(|&p| (p, None)).collect();
    };
    MA_PERIODS.iter().map(|&p| (p, sma(bars, last, p))).collect()
}
