//! Game loading for the runner.
//!
//! Resolves where bars come from and picks a game. The fallback policy:
//! 1. `data.synthetic` set → generate a synthetic universe (tagged)
//! 2. CSV directory exists → pick from it
//! 3. Otherwise → fail with a clear error pointing at `--synthetic`
//!
//! Synthetic games are a practice and debug mode; their metadata carries the
//! `synthetic` flag so saved artifacts can be told apart.

use crate::config::ReplayConfig;
use barreplay_core::data::{
    game_rng, pick_game, synthetic_source, BarSource, CsvDirectory, DataError, GameSetup,
};
use barreplay_core::{Session, SessionError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Tickers in the generated practice universe.
pub const SYNTHETIC_TICKERS: usize = 8;
/// Bars per generated ticker: enough history and remaining days for the
/// default eligibility policy.
pub const SYNTHETIC_BARS: usize = 1_500;
/// Seed for the generated universe when no seed is configured.
const SYNTHETIC_UNIVERSE_SEED: u64 = 0x5eed;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "data directory '{}' does not exist (use --synthetic for generated data)",
        dir.display()
    )]
    MissingDataDir { dir: PathBuf },

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Provenance of a picked game, written next to its artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMeta {
    pub ticker: String,
    pub start_date: Option<NaiveDate>,
    pub start_index: usize,
    /// Bars from the start day to the end of data, inclusive.
    pub remaining_days: usize,
    pub dataset_hash: String,
    pub seed: Option<u64>,
    pub synthetic: bool,
}

impl GameMeta {
    pub fn from_setup(setup: &GameSetup, seed: Option<u64>, synthetic: bool) -> Self {
        Self {
            ticker: setup.ticker().to_string(),
            start_date: setup.start_date(),
            start_index: setup.start_index,
            remaining_days: setup.remaining_bars(),
            dataset_hash: setup.dataset_hash.clone(),
            seed,
            synthetic,
        }
    }
}

/// A picked game plus its provenance.
#[derive(Debug, Clone)]
pub struct LoadedGame {
    pub setup: GameSetup,
    pub meta: GameMeta,
}

impl LoadedGame {
    /// Start a session on this game with the configured account.
    pub fn start_session(&self, config: &ReplayConfig) -> Result<Session, SessionError> {
        Session::new(
            self.setup.series.clone(),
            self.setup.start_index,
            config.session_config(),
        )
    }
}

/// Pick a game according to `config`, applying the data fallback policy.
pub fn load_game(config: &ReplayConfig) -> Result<LoadedGame, LoadError> {
    let seed = config.data.seed;
    let synthetic = config.data.synthetic;

    let source: Box<dyn BarSource> = if synthetic {
        warn!("using synthetic data; results will be tagged as synthetic");
        Box::new(synthetic_source(
            SYNTHETIC_TICKERS,
            SYNTHETIC_BARS,
            seed.unwrap_or(SYNTHETIC_UNIVERSE_SEED),
        ))
    } else if config.data.dir.is_dir() {
        Box::new(CsvDirectory::new(&config.data.dir))
    } else {
        return Err(LoadError::MissingDataDir {
            dir: config.data.dir.clone(),
        });
    };

    let mut rng = game_rng(seed);
    let setup = pick_game(source.as_ref(), &config.selection, &mut rng)?;
    let meta = GameMeta::from_setup(&setup, seed, synthetic);
    info!(
        source = source.name(),
        ticker = %meta.ticker,
        dataset_hash = %meta.dataset_hash,
        "game loaded"
    );
    Ok(LoadedGame { setup, meta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use barreplay_core::data::synthetic_bars;
    use std::fmt::Write as _;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_data_dir() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "barreplay_game_test_{}_{n}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_csv(dir: &std::path::Path, ticker: &str, count: usize) {
        let bars = synthetic_bars(ticker, NaiveDate::from_ymd_opt(2016, 6, 1).unwrap(), count, 3);
        let mut text = String::from("date,open,close,high,low,change_pct,volume,turnover_rate,pe,pb\n");
        for b in bars {
            writeln!(
                text,
                "{},{},{},{},{},{},{},,,",
                b.date, b.open, b.close, b.high, b.low, b.change_pct, b.volume
            )
            .unwrap();
        }
        std::fs::write(dir.join(format!("{ticker}.csv")), text).unwrap();
    }

    #[test]
    fn missing_dir_without_synthetic_fails() {
        let mut config = ReplayConfig::default();
        config.data.dir = PathBuf::from("/definitely/not/here");
        let err = load_game(&config).unwrap_err();
        assert!(matches!(err, LoadError::MissingDataDir { .. }));
        assert!(err.to_string().contains("--synthetic"));
    }

    #[test]
    fn synthetic_game_is_tagged_and_reproducible() {
        let mut config = ReplayConfig::default();
        config.data.dir = PathBuf::from("/definitely/not/here");
        config.data.synthetic = true;
        config.data.seed = Some(99);

        let a = load_game(&config).unwrap();
        let b = load_game(&config).unwrap();
        assert!(a.meta.synthetic);
        assert_eq!(a.meta, b.meta);
        assert!(a.meta.remaining_days >= config.selection.min_remaining);
    }

    #[test]
    fn csv_dir_game_starts_a_session() {
        let dir = temp_data_dir();
        write_csv(&dir, "600000", 700);

        let mut config = ReplayConfig::default();
        config.data.dir = dir.clone();
        config.data.seed = Some(1);
        config.selection.min_remaining = 200;

        let game = load_game(&config).unwrap();
        assert_eq!(game.meta.ticker, "600000");
        assert!(!game.meta.synthetic);

        let session = game.start_session(&config).unwrap();
        assert_eq!(session.day_count(), 0);
        assert_eq!(session.cash(), config.session.initial_cash);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_dir_reports_no_tickers() {
        let dir = temp_data_dir();
        let mut config = ReplayConfig::default();
        config.data.dir = dir.clone();
        let err = load_game(&config).unwrap_err();
        assert!(matches!(err, LoadError::Data(DataError::NoTickers { .. })));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
