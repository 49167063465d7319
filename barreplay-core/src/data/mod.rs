//! Market data: bar sources, CSV ingestion, synthetic bars, and random game selection.

pub mod csv_source;
pub mod provider;
pub mod selection;
pub mod synthetic;

pub use csv_source::{parse_bars, parse_date, CsvDirectory};
pub use provider::{BarSource, DataError, MemorySource};
pub use selection::{dataset_hash, game_rng, pick_game, EligibilityPolicy, GameSetup};
pub use synthetic::{synthetic_bars, synthetic_source};
