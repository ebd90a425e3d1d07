//! CSV file market data adapter.
//!
//! Layout: `<base>/<timeframe code>/<SYMBOL>.csv` with header
//! `timestamp,open,high,low,close,volume`. Rows are returned in file order so
//! that out-of-order files surface as malformed series.

use crate::domain::error::ScannerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::timeframe::Timeframe;
use crate::ports::data_port::MarketDataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Integers at or above this are read as milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: &Timeframe) -> PathBuf {
        self.base_path
            .join(&timeframe.code)
            .join(format!("{}.csv", symbol))
    }
}

/// Unix seconds or milliseconds, RFC 3339, `%Y-%m-%d %H:%M:%S` or `%Y-%m-%d`.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(n) = value.parse::<i64>() {
        let dt = if n.abs() >= MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(n)
        } else {
            DateTime::from_timestamp(n, 0)
        };
        return dt.map(|d| d.naive_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn read_bars(path: &Path) -> Result<Vec<OhlcvBar>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| format!("CSV parse error: {}", e))?;

        let raw_ts = record
            .get(0)
            .ok_or_else(|| format!("row {}: missing timestamp column", row + 1))?;
        let timestamp = parse_timestamp(raw_ts)
            .ok_or_else(|| format!("row {}: invalid timestamp '{}'", row + 1, raw_ts))?;

        let number = |idx: usize, name: &str| -> Result<f64, String> {
            record
                .get(idx)
                .ok_or_else(|| format!("row {}: missing {} column", row + 1, name))?
                .trim()
                .parse()
                .map_err(|e| format!("row {}: invalid {} value: {}", row + 1, name, e))
        };

        bars.push(OhlcvBar {
            timestamp,
            open: number(1, "open")?,
            high: number(2, "high")?,
            low: number(3, "low")?,
            close: number(4, "close")?,
            volume: number(5, "volume")?,
        });
    }

    Ok(bars)
}

impl MarketDataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &Timeframe,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, ScannerError> {
        let path = self.csv_path(symbol, timeframe);
        let mut bars = read_bars(&path).map_err(|reason| ScannerError::Fetch {
            symbol: symbol.to_string(),
            timeframe: timeframe.label.clone(),
            reason,
        })?;

        if bars.len() > limit {
            bars = bars.split_off(bars.len() - limit);
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScannerError> {
        let read_dir = |dir: &Path| {
            fs::read_dir(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("failed to read directory {}: {}", dir.display(), e),
                )
            })
        };

        let mut symbols = BTreeSet::new();
        for entry in read_dir(self.base_path.as_path())? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            for file in read_dir(entry.path().as_path())? {
                let path = file?.path();
                if path.extension().is_some_and(|ext| ext == "csv") {
                    if let Some(stem) = path.file_stem() {
                        symbols.insert(stem.to_string_lossy().to_string());
                    }
                }
            }
        }

        Ok(symbols.into_iter().collect())
    }
}
