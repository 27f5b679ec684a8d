//! Bar loading: the injected data source of a selection run.
//!
//! `BarLoader` is the seam: the runner only ever asks "give me the series for
//! this ticker". `CsvDirLoader` reads `<dir>/<ticker>.csv`; `MemoryLoader`
//! serves pre-built series (tests, embedding).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use stockpick_core::domain::{Bar, BarSeries};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no bar data for '{ticker}'")]
    NotFound { ticker: String },

    #[error("malformed bar data for '{ticker}': {reason}")]
    Malformed { ticker: String, reason: String },

    #[error("failed to read bar data for '{ticker}': {source}")]
    Io {
        ticker: String,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    pub fn ticker(&self) -> &str {
        match self {
            Self::NotFound { ticker } | Self::Malformed { ticker, .. } | Self::Io { ticker, .. } => {
                ticker
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Source of per-ticker bar history.
pub trait BarLoader: Send + Sync {
    /// Load the full validated series for `ticker`, ascending by date.
    fn load(&self, ticker: &str) -> Result<BarSeries, LoadError>;
}

// ─── CSV directory ───────────────────────────────────────────────────

/// One CSV row. Columns are matched by header name, so order is free and
/// extra columns are ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    close: f64,
    high: f64,
    low: f64,
    volume: f64,
}

/// Reads `<dir>/<ticker>.csv` files with a `date,open,close,high,low,volume` header.
#[derive(Debug, Clone)]
pub struct CsvDirLoader {
    dir: PathBuf,
}

impl CsvDirLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    /// Stems of every `*.csv` file in the directory, sorted.
    pub fn list_tickers(&self) -> io::Result<Vec<String>> {
        let mut tickers = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tickers.push(stem.to_string());
            }
        }
        tickers.sort();
        Ok(tickers)
    }

    /// Rows in file order, then sorted by date; duplicates are left for
    /// `BarSeries::new` to reject.
    fn read_rows(&self, ticker: &str, file: File) -> Result<Vec<Bar>, LoadError> {
        let malformed = |reason: String| LoadError::Malformed {
            ticker: ticker.to_string(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let mut bars = Vec::new();
        for (line, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = record.map_err(|e| malformed(e.to_string()))?;
            let date = parse_date(&row.date)
                .ok_or_else(|| malformed(format!("row {}: bad date '{}'", line + 1, row.date)))?;
            if !row.volume.is_finite() || row.volume < 0.0 {
                return Err(malformed(format!("row {}: bad volume {}", line + 1, row.volume)));
            }
            bars.push(Bar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.round() as u64,
            });
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl BarLoader for CsvDirLoader {
    fn load(&self, ticker: &str) -> Result<BarSeries, LoadError> {
        let file = match File::open(self.path_for(ticker)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound {
                    ticker: ticker.to_string(),
                })
            }
            Err(source) => {
                return Err(LoadError::Io {
                    ticker: ticker.to_string(),
                    source,
                })
            }
        };
        let bars = self.read_rows(ticker, file)?;
        BarSeries::new(ticker, bars).map_err(|e| LoadError::Malformed {
            ticker: ticker.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Accepts `YYYY-MM-DD`, `YYYYMMDD` and `YYYY-MM-DD HH:MM:SS`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .ok()
}

// ─── In-memory ───────────────────────────────────────────────────────

/// Serves series held in memory. Unknown tickers are `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    series: BTreeMap<String, BarSeries>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: BarSeries) {
        self.series.insert(series.ticker().to_string(), series);
    }

    pub fn with(mut self, series: BarSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn tickers(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }
}

impl BarLoader for MemoryLoader {
    fn load(&self, ticker: &str) -> Result<BarSeries, LoadError> {
        self.series
            .get(ticker)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                ticker: ticker.to_string(),
            })
    }
}
