//! Settlement artifacts.
//!
//! Each finished game gets its own directory under the output root, named by
//! a run id derived from what was played:
//!
//! ```text
//! <output_dir>/<run_id>/
//!     report.json   settlement report plus game metadata
//!     trades.csv    one row per executed order
//!     assets.csv    total assets per simulated day
//! ```

use crate::game::GameMeta;
use anyhow::{Context, Result};
use barreplay_core::domain::day_label;
use barreplay_core::{SettlementReport, Trade};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Contents of `report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub game: GameMeta,
    pub report: SettlementReport,
}

#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    day: String,
    date: String,
    action: &'a str,
    price: f64,
    volume: u64,
    amount: f64,
    profit_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
struct AssetRow {
    day: usize,
    label: String,
    total_assets: f64,
}

/// Deterministic run id: BLAKE3 over ticker, dataset hash, and the trade log.
/// The same game played the same way always lands in the same directory.
pub fn run_id(report: &SettlementReport, game: &GameMeta) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(report.ticker.as_bytes());
    hasher.update(game.dataset_hash.as_bytes());
    hasher.update(&(report.total_days as u64).to_le_bytes());
    for trade in &report.trade_log {
        hasher.update(&(trade.day_offset as u64).to_le_bytes());
        hasher.update(trade.action.to_string().as_bytes());
        hasher.update(&trade.price.to_le_bytes());
        hasher.update(&trade.volume.to_le_bytes());
    }
    let hex = hasher.finalize().to_hex();
    hex.as_str()[..16].to_string()
}

/// Write all artifacts for one settled game. Returns the run directory.
pub fn save_artifacts(
    report: &SettlementReport,
    game: &GameMeta,
    output_dir: &Path,
) -> Result<PathBuf> {
    let run_id = run_id(report, game);
    let run_dir = output_dir.join(&run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create run directory {}", run_dir.display()))?;

    let record = RunRecord {
        run_id: run_id.clone(),
        game: game.clone(),
        report: report.clone(),
    };
    write_report_json(&run_dir.join("report.json"), &record)?;
    write_trades_csv(&run_dir.join("trades.csv"), &report.trade_log)?;
    write_assets_csv(&run_dir.join("assets.csv"), &report.assets_history)?;

    info!(%run_id, dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Read back a saved `report.json`.
pub fn load_run_record(path: &Path) -> Result<RunRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run record {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse run record {}", path.display()))
}

fn write_report_json(path: &Path, record: &RunRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(())
}

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create trades CSV {}", path.display()))?;
    for trade in trades {
        let action = trade.action.to_string();
        wtr.serialize(TradeRow {
            day: trade.day_label(),
            date: trade.date.to_string(),
            action: &action,
            price: trade.price,
            volume: trade.volume,
            amount: trade.amount(),
            profit_rate: trade.profit_rate,
        })?;
    }
    if trades.is_empty() {
        wtr.write_record(["day", "date", "action", "price", "volume", "amount", "profit_rate"])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_assets_csv(path: &Path, history: &[f64]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create assets CSV {}", path.display()))?;
    for (day, &total_assets) in history.iter().enumerate() {
        wtr.serialize(AssetRow {
            day,
            label: day_label(day as i64),
            total_assets,
        })?;
    }
    if history.is_empty() {
        wtr.write_record(["day", "label", "total_assets"])?;
    }
    wtr.flush()?;
    Ok(())
}
