#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use trendscan::domain::error::ScannerError;
pub use trendscan::domain::ohlcv::OhlcvBar;
use trendscan::domain::timeframe::Timeframe;
use trendscan::ports::data_port::MarketDataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub fetches: AtomicUsize,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &Timeframe,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, ScannerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ScannerError::Fetch {
                symbol: symbol.to_string(),
                timeframe: timeframe.label.clone(),
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(symbol).cloned().unwrap_or_default();
        let skip = bars.len().saturating_sub(limit);
        Ok(bars.into_iter().skip(skip).collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScannerError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn daily() -> Timeframe {
    Timeframe::new("Daily", "1d")
}

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Daily bars around each close, with a 1% high/low band.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            OhlcvBar {
                timestamp: start_time() + Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: 1_000.0 + i as f64,
            }
        })
        .collect()
}

/// Geometric trend: each close is the previous times `1 + rate`.
pub fn trending_bars(n: usize, start: f64, rate: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| start * (1.0 + rate).powi(i as i32))
        .collect();
    bars_from_closes(&closes)
}

pub fn flat_bars(n: usize, price: f64) -> Vec<OhlcvBar> {
    bars_from_closes(&vec![price; n])
}

/// Oscillating closes around `center`.
pub fn choppy_bars(n: usize, center: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| center * (1.0 + 0.03 * ((i as f64) * 0.9).sin()))
        .collect();
    bars_from_closes(&closes)
}

/// Deterministic pseudo-random walk seeded by `seed`.
pub fn random_walk_bars(n: usize, seed: u64) -> Vec<OhlcvBar> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut price = 100.0;
    let closes: Vec<f64> = (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let step = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
            price *= 1.0 + step * 0.04;
            price
        })
        .collect();
    bars_from_closes(&closes)
}
