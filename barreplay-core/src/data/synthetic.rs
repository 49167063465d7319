//! Synthetic bars for offline play, demos and tests.
//!
//! A seeded random walk starting at 10.0. The same `(ticker, seed)` always
//! produces the same series.

use super::provider::MemorySource;
use crate::domain::Bar;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate `count` weekday bars starting at `start`.
pub fn synthetic_bars(ticker: &str, start: NaiveDate, count: usize, seed: u64) -> Vec<Bar> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(ticker.as_bytes());
    hasher.update(&seed.to_le_bytes());
    let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

    let mut bars = Vec::with_capacity(count);
    let mut price = 10.0_f64;
    let mut current = start;
    let mut pe = rng.gen_range(8.0..40.0);

    while bars.len() < count {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price * (1.0 + rng.gen_range(-0.005..0.005));
        let close = (price * (1.0 + daily_return)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        pe *= 1.0 + daily_return;

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            volume: rng.gen_range(500_000..5_000_000u64),
            turnover_rate: Some(rng.gen_range(0.2..5.0)),
            pe: Some(pe),
            pb: Some(pe / 10.0),
            change_pct: (close - price) / price * 100.0,
        });

        price = close;
        current += Duration::days(1);
    }

    bars
}

/// A [`MemorySource`] holding `tickers` synthetic securities of `bars_each` bars,
/// all starting 2015-01-05.
pub fn synthetic_source(tickers: usize, bars_each: usize, seed: u64) -> MemorySource {
    let start = NaiveDate::from_ymd_opt(2015, 1, 5).unwrap_or_default();
    let mut source = MemorySource::new("synthetic");
    for i in 0..tickers {
        let ticker = format!("SYN{:03}", i + 1);
        let bars = synthetic_bars(&ticker, start, bars_each, seed);
        source.insert(ticker, bars);
    }
    source
}
