//! Bar source trait and structured error types.
//!
//! The BarSource trait abstracts over where daily bars come from (a directory
//! of CSV files, synthetic data, fixtures in tests) so game selection never
//! touches the filesystem directly.

use crate::domain::Bar;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV for '{ticker}': {reason}")]
    Csv { ticker: String, reason: String },

    #[error("'{ticker}' has no '{column}' column")]
    MissingColumn { ticker: String, column: String },

    #[error("ticker not found: {ticker}")]
    TickerNotFound { ticker: String },

    #[error("no securities available from {source_name}")]
    NoTickers { source_name: String },

    #[error(
        "no eligible security after {attempts} attempts (need a listing after {listed_after}, \
         {min_history} bars of history and {min_remaining} bars remaining)"
    )]
    NoEligibleSecurity {
        attempts: usize,
        listed_after: chrono::NaiveDate,
        min_history: usize,
        min_remaining: usize,
    },
}

/// Supplies the historical bars of individual securities.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// All tickers this source can load, in a stable order.
    fn tickers(&self) -> Result<Vec<String>, DataError>;

    /// Daily bars for `ticker`, oldest first.
    fn load(&self, ticker: &str) -> Result<Vec<Bar>, DataError>;
}

/// In-memory source, used for synthetic play and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    series: BTreeMap<String, Vec<Bar>>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, ticker: impl Into<String>, bars: Vec<Bar>) {
        self.series.insert(ticker.into(), bars);
    }

    pub fn with(mut self, ticker: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.insert(ticker, bars);
        self
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl BarSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn tickers(&self) -> Result<Vec<String>, DataError> {
        Ok(self.series.keys().cloned().collect())
    }

    fn load(&self, ticker: &str) -> Result<Vec<Bar>, DataError> {
        self.series
            .get(ticker)
            .cloned()
            .ok_or_else(|| DataError::TickerNotFound {
                ticker: ticker.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_lists_and_loads() {
        let source = MemorySource::new("fixture")
            .with("B", Vec::new())
            .with("A", Vec::new());
        assert_eq!(source.name(), "fixture");
        assert_eq!(source.tickers().unwrap(), vec!["A", "B"]);
        assert!(source.load("A").unwrap().is_empty());
        assert!(matches!(
            source.load("C"),
            Err(DataError::TickerNotFound { .. })
        ));
    }
}
