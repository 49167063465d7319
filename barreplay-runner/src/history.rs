//! Game history: JSONL append-only log of finished games.
//!
//! One JSON object per line, so a crash mid-write costs at most the last
//! entry and the file can be streamed or grepped.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::game::GameMeta;
use barreplay_core::SettlementReport;

/// Headline result of one finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub finished_at: DateTime<Utc>,
    pub run_id: Option<String>,
    pub ticker: String,
    pub start_date: Option<NaiveDate>,
    pub dataset_hash: String,
    pub synthetic: bool,
    pub total_days: usize,
    pub final_assets: f64,
    pub total_return_rate: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub total_trades: usize,
}

impl HistoryEntry {
    pub fn new(report: &SettlementReport, game: &GameMeta, run_id: Option<String>) -> Self {
        Self {
            finished_at: Utc::now(),
            run_id,
            ticker: report.ticker.clone(),
            start_date: game.start_date,
            dataset_hash: game.dataset_hash.clone(),
            synthetic: game.synthetic,
            total_days: report.total_days,
            final_assets: report.final_assets,
            total_return_rate: report.total_return_rate,
            max_drawdown: report.max_drawdown,
            win_rate: report.win_rate,
            total_trades: report.total_trades,
        }
    }
}

/// Aggregate over every recorded game.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HistorySummary {
    pub games: usize,
    pub profitable: usize,
    pub mean_return_rate: f64,
    pub best_return_rate: f64,
    pub worst_return_rate: f64,
}

/// JSONL history file manager.
#[derive(Debug, Clone)]
pub struct GameHistory {
    path: PathBuf,
}

impl GameHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one entry, creating the file and its parent directory if needed.
    pub fn append(&self, entry: &HistoryEntry) -> io::Result<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "{json}")?;
        file.flush()?;
        Ok(())
    }

    /// Read every entry. A missing file is an empty history; malformed lines
    /// are skipped.
    pub fn load(&self) -> io::Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = io::BufReader::new(fs::File::open(&self.path)?);
        let mut entries = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(line = idx + 1, error = %e, "skipping malformed history line"),
            }
        }
        Ok(entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn summarize(entries: &[HistoryEntry]) -> HistorySummary {
    if entries.is_empty() {
        return HistorySummary::default();
    }
    let returns = entries.iter().map(|e| e.total_return_rate);
    HistorySummary {
        games: entries.len(),
        profitable: entries.iter().filter(|e| e.total_return_rate > 0.0).count(),
        mean_return_rate: returns.clone().sum::<f64>() / entries.len() as f64,
        best_return_rate: returns.clone().fold(f64::NEG_INFINITY, f64::max),
        worst_return_rate: returns.fold(f64::INFINITY, f64::min),
    }
}
