//! CSV directory source: one `<ticker>.csv` file per security.
//!
//! Expected header columns (any order, surrounding whitespace ignored):
//! `date, open, close, high, low, change_pct, volume, turnover_rate, pe, pb`.
//! Only `date` and `close` are mandatory.
//!
//! Cleaning rules:
//! - rows whose date does not parse are dropped
//! - rows without a positive close are dropped
//! - a missing open/high/low falls back to the close
//! - a missing `change_pct` or `volume` becomes 0
//! - a missing `turnover_rate`, `pe` or `pb` becomes `None`
//! - rows are sorted oldest first
//!
//! Files are read as UTF-8; invalid byte sequences are replaced with U+FFFD
//! rather than decoded as GBK. Every numeric and date column is ASCII, so a
//! GBK-encoded export still parses as long as its header row names the
//! columns in ASCII. Localized (non-ASCII) header names are not recognized.

use super::provider::{BarSource, DataError};
use crate::domain::Bar;
use chrono::NaiveDate;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// A directory of per-ticker CSV files.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
    name: String,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = format!("csv:{}", dir.display());
        Self { dir, name }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }
}

impl BarSource for CsvDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn tickers(&self) -> Result<Vec<String>, DataError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| DataError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut tickers: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        tickers.sort();
        Ok(tickers)
    }

    fn load(&self, ticker: &str) -> Result<Vec<Bar>, DataError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(DataError::TickerNotFound {
                ticker: ticker.to_string(),
            });
        }
        let file = std::fs::File::open(&path).map_err(|source| DataError::Io {
            path: path.clone(),
            source,
        })?;
        parse_bars(ticker, file)
    }
}

/// Column positions resolved from the header row.
struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    change_pct: Option<usize>,
    volume: Option<usize>,
    turnover_rate: Option<usize>,
    pe: Option<usize>,
    pb: Option<usize>,
}

impl Columns {
    fn resolve(ticker: &str, headers: &[String]) -> Result<Self, DataError> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let require = |name: &str| {
            find(name).ok_or_else(|| DataError::MissingColumn {
                ticker: ticker.to_string(),
                column: name.to_string(),
            })
        };
        Ok(Self {
            date: require("date")?,
            close: require("close")?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            change_pct: find("change_pct"),
            volume: find("volume"),
            turnover_rate: find("turnover_rate"),
            pe: find("pe"),
            pb: find("pb"),
        })
    }
}

/// Parse a bar CSV from any reader. Invalid UTF-8 is decoded lossily.
pub fn parse_bars<R: Read>(ticker: &str, reader: R) -> Result<Vec<Bar>, DataError> {
    let csv_err = |e: csv::Error| DataError::Csv {
        ticker: ticker.to_string(),
        reason: e.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let cols = Columns::resolve(ticker, &headers)?;

    let mut bars = Vec::new();
    let mut dropped = 0usize;
    for record in rdr.byte_records() {
        let record = record.map_err(csv_err)?;
        let field = |idx: usize| record.get(idx).map(String::from_utf8_lossy);
        let number = |idx: Option<usize>| idx.and_then(|i| field(i)).and_then(|s| parse_number(&s));

        let Some(date) = field(cols.date).and_then(|s| parse_date(&s)) else {
            dropped += 1;
            continue;
        };
        let close = match number(Some(cols.close)) {
            Some(c) if c > 0.0 => c,
            _ => {
                dropped += 1;
                continue;
            }
        };

        bars.push(Bar {
            date,
            open: number(cols.open).filter(|v| *v > 0.0).unwrap_or(close),
            high: number(cols.high).filter(|v| *v > 0.0).unwrap_or(close),
            low: number(cols.low).filter(|v| *v > 0.0).unwrap_or(close),
            close,
            volume: number(cols.volume)
                .filter(|v| *v > 0.0)
                .map(|v| v.round() as u64)
                .unwrap_or(0),
            turnover_rate: number(cols.turnover_rate),
            pe: number(cols.pe),
            pb: number(cols.pb),
            change_pct: number(cols.change_pct).unwrap_or(0.0),
        });
    }

    if dropped > 0 {
        warn!(ticker, dropped, "dropped rows with unparseable date or close");
    }
    bars.sort_by_key(|b| b.date);
    debug!(ticker, bars = bars.len(), "parsed bar CSV");
    Ok(bars)
}

/// Parse a date, ignoring any time-of-day suffix.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let token = raw.split_whitespace().next()?;
    let token = token.split('T').next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%');
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
