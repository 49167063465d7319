//! Random game selection.
//!
//! Picks a random security and a random start day that leaves enough history
//! before it (for the chart) and enough bars after it (for the replay). The
//! returned series is trimmed to a lookback window ending at the last bar, with
//! `start_index` pointing into the trimmed slice.

use super::provider::{BarSource, DataError};
use crate::domain::{Bar, BarSeries};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Constraints a security and start day must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityPolicy {
    /// The start day must be strictly after this date.
    pub listed_after: NaiveDate,
    /// Minimum number of bars before the start day.
    pub min_history: usize,
    /// Minimum number of bars from the start day to the end of data.
    pub min_remaining: usize,
    /// Bars of history kept before the start day.
    pub lookback: usize,
    /// Random draws before giving up.
    pub max_attempts: usize,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            listed_after: NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or_default(),
            min_history: 60,
            min_remaining: 500,
            lookback: 300,
            max_attempts: 100,
        }
    }
}

impl EligibilityPolicy {
    /// Inclusive range of valid start indices in `bars`, or `None` when the
    /// series is too short or has no bars after `listed_after`.
    pub fn start_range(&self, bars: &[Bar]) -> Option<(usize, usize)> {
        let first_after = bars.iter().position(|b| b.date > self.listed_after)?;
        let min_idx = first_after.max(self.min_history);
        let max_idx = bars.len().checked_sub(self.min_remaining)?;
        if min_idx >= max_idx {
            return None;
        }
        Some((min_idx, max_idx))
    }
}

/// A ready-to-play game: the bar window and where play begins.
#[derive(Debug, Clone)]
pub struct GameSetup {
    pub series: BarSeries,
    pub start_index: usize,
    /// BLAKE3 hex digest of the bar window, for reproducibility records.
    pub dataset_hash: String,
}

impl GameSetup {
    /// Trim `bars` to `lookback` bars before `target` and everything after it.
    pub fn from_bars(ticker: &str, bars: Vec<Bar>, target: usize, lookback: usize) -> Self {
        let slice_start = target.saturating_sub(lookback);
        let window: Vec<Bar> = bars.into_iter().skip(slice_start).collect();
        let dataset_hash = dataset_hash(ticker, &window);
        Self {
            series: BarSeries::new(ticker, window),
            start_index: target - slice_start,
            dataset_hash,
        }
    }

    pub fn ticker(&self) -> &str {
        self.series.ticker()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.series.get(self.start_index).map(|b| b.date)
    }

    /// Bars from the start day to the end of data, inclusive.
    pub fn remaining_bars(&self) -> usize {
        self.series.len().saturating_sub(self.start_index)
    }
}

/// RNG for game selection: seeded when reproducibility is wanted.
pub fn game_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Pick a random eligible security and start day from `source`.
pub fn pick_game<R: Rng>(
    source: &dyn BarSource,
    policy: &EligibilityPolicy,
    rng: &mut R,
) -> Result<GameSetup, DataError> {
    let tickers = source.tickers()?;
    if tickers.is_empty() {
        return Err(DataError::NoTickers {
            source_name: source.name().to_string(),
        });
    }

    for _ in 0..policy.max_attempts {
        let Some(ticker) = tickers.choose(rng) else {
            break;
        };
        let bars = match source.load(ticker) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(%ticker, error = %e, "skipping unreadable security");
                continue;
            }
        };
        let Some((min_idx, max_idx)) = policy.start_range(&bars) else {
            continue;
        };

        let target = rng.gen_range(min_idx..=max_idx);
        let game = GameSetup::from_bars(ticker, bars, target, policy.lookback);
        info!(
            ticker = game.ticker(),
            start_date = ?game.start_date(),
            remaining = game.remaining_bars(),
            "picked game"
        );
        return Ok(game);
    }

    Err(DataError::NoEligibleSecurity {
        attempts: policy.max_attempts,
        listed_after: policy.listed_after,
        min_history: policy.min_history,
        min_remaining: policy.min_remaining,
    })
}

/// Deterministic BLAKE3 hash over the ticker and all bar fields.
pub fn dataset_hash(ticker: &str, bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(ticker.as_bytes());
    for bar in bars {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
        hasher.update(&bar.change_pct.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::MemorySource;
    use crate::data::synthetic::{synthetic_bars, synthetic_source};

    fn policy(min_history: usize, min_remaining: usize, lookback: usize) -> EligibilityPolicy {
        EligibilityPolicy {
            listed_after: NaiveDate::from_ymd_opt(2016, 1, 1).unwrap(),
            min_history,
            min_remaining,
            lookback,
            max_attempts: 20,
        }
    }

    #[test]
    fn start_range_respects_date_history_and_remaining() {
        // 2015-01-05 start: roughly 260 weekdays before 2016
        let bars = synthetic_bars("X", NaiveDate::from_ymd_opt(2015, 1, 5).unwrap(), 1000, 1);
        let first_after = bars
            .iter()
            .position(|b| b.date > NaiveDate::from_ymd_opt(2016, 1, 1).unwrap())
            .unwrap();

        let (min_idx, max_idx) = policy(60, 500, 300).start_range(&bars).unwrap();
        assert_eq!(min_idx, first_after);
        assert_eq!(max_idx, 500);
    }

    #[test]
    fn start_range_uses_min_history_for_young_listings() {
        let bars = synthetic_bars("X", NaiveDate::from_ymd_opt(2017, 1, 2).unwrap(), 700, 1);
        let (min_idx, _) = policy(60, 500, 300).start_range(&bars).unwrap();
        assert_eq!(min_idx, 60);
    }

    #[test]
    fn start_range_none_when_too_short() {
        let bars = synthetic_bars("X", NaiveDate::from_ymd_opt(2017, 1, 2).unwrap(), 400, 1);
        assert_eq!(policy(60, 500, 300).start_range(&bars), None);

        let old = synthetic_bars("X", NaiveDate::from_ymd_opt(2010, 1, 4).unwrap(), 100, 1);
        assert_eq!(policy(10, 10, 10).start_range(&old), None);
    }

    #[test]
    fn from_bars_trims_lookback() {
        let bars = synthetic_bars("X", NaiveDate::from_ymd_opt(2017, 1, 2).unwrap(), 1000, 1);
        let target_date = bars[400].date;

        let game = GameSetup::from_bars("X", bars.clone(), 400, 300);
        assert_eq!(game.start_index, 300);
        assert_eq!(game.series.len(), 700);
        assert_eq!(game.start_date(), Some(target_date));
        assert_eq!(game.remaining_bars(), 600);

        let early = GameSetup::from_bars("X", bars, 100, 300);
        assert_eq!(early.start_index, 100);
        assert_eq!(early.series.len(), 1000);
    }

    #[test]
    fn pick_game_is_reproducible_with_seed() {
        let source = synthetic_source(5, 1200, 9);
        let policy = EligibilityPolicy::default();

        let a = pick_game(&source, &policy, &mut game_rng(Some(3))).unwrap();
        let b = pick_game(&source, &policy, &mut game_rng(Some(3))).unwrap();
        assert_eq!(a.ticker(), b.ticker());
        assert_eq!(a.start_index, b.start_index);
        assert_eq!(a.dataset_hash, b.dataset_hash);
        assert!(a.remaining_bars() >= policy.min_remaining);
        assert!(a.start_date().unwrap() > policy.listed_after);
    }

    #[test]
    fn pick_game_skips_ineligible_securities() {
        let start = NaiveDate::from_ymd_opt(2017, 1, 2).unwrap();
        let source = MemorySource::new("mixed")
            .with("SHORT", synthetic_bars("SHORT", start, 50, 1))
            .with("LONG", synthetic_bars("LONG", start, 800, 1));
        let policy = EligibilityPolicy {
            max_attempts: 200,
            ..EligibilityPolicy::default()
        };

        let game = pick_game(&source, &policy, &mut game_rng(Some(11))).unwrap();
        assert_eq!(game.ticker(), "LONG");
    }

    #[test]
    fn pick_game_errors_when_nothing_qualifies() {
        let start = NaiveDate::from_ymd_opt(2017, 1, 2).unwrap();
        let source = MemorySource::new("short").with("A", synthetic_bars("A", start, 50, 1));
        let err = pick_game(&source, &policy(60, 500, 300), &mut game_rng(Some(1))).unwrap_err();
        assert!(matches!(err, DataError::NoEligibleSecurity { attempts: 20, .. }));

        let empty = MemorySource::new("empty");
        assert!(matches!(
            pick_game(&empty, &EligibilityPolicy::default(), &mut game_rng(None)),
            Err(DataError::NoTickers { .. })
        ));
    }
}
