//! BarReplay Runner: configuration, game loading, scripted replays, artifacts.
//!
//! This crate builds on `barreplay-core` to provide:
//! - TOML configuration with validated defaults
//! - Game loading from a CSV directory with synthetic fallback
//! - Scripted (headless) replays with rejection tracking
//! - Settlement artifacts (report JSON, trade and asset CSVs)
//! - JSONL game history

pub mod config;
pub mod game;
pub mod history;
pub mod reporting;
pub mod script;

pub use config::{ConfigError, DataSection, OutputSection, ReplayConfig, SessionSection};
pub use game::{load_game, GameMeta, LoadError, LoadedGame};
pub use history::{summarize, GameHistory, HistoryEntry, HistorySummary};
pub use reporting::{load_run_record, run_id, save_artifacts, RunRecord};
pub use script::{
    run_script, Rejection, ReplayScript, ScriptError, ScriptLine, ScriptOutcome, ScriptStep,
    StopReason,
};
