//! Technical indicators behind the snapshot: DMI, RSI, MACD, midrange and
//! the simple/exponential averages.
//!
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values

pub mod dmi;
pub mod ema;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod macd;
pub mod midrange;
pub mod rsi;
pub mod sma;

pub use dmi::calculate_dmi;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use midrange::calculate_midrange;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Adx(usize),
    PlusDi(usize),
    MinusDi(usize),
    MidRange(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    /// Valid simple values as `Some`, warmup points as `None`.
    pub fn simple_values(&self) -> Vec<Option<f64>> {
        self.values
            .iter()
            .map(|p| match p.value {
                IndicatorValue::Simple(v) if p.valid => Some(v),
                _ => None,
            })
            .collect()
    }

    /// Split a MACD series into (line, signal, histogram) columns.
    pub fn macd_columns(&self) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
        let mut lines = Vec::with_capacity(self.values.len());
        let mut signals = Vec::with_capacity(self.values.len());
        let mut histograms = Vec::with_capacity(self.values.len());

        for point in &self.values {
            match point.value {
                IndicatorValue::Macd {
                    line,
                    signal,
                    histogram,
                } if point.valid => {
                    lines.push(Some(line));
                    signals.push(Some(signal));
                    histograms.push(Some(histogram));
                }
                _ => {
                    lines.push(None);
                    signals.push(None);
                    histograms.push(None);
                }
            }
        }

        (lines, signals, histograms)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::PlusDi(period) => write!(f, "+DI({})", period),
            IndicatorType::MinusDi(period) => write!(f, "-DI({})", period),
            IndicatorType::MidRange(period) => write!(f, "MIDRANGE({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}
