//! Indicator snapshot at the last candle of a series.
//!
//! Each field is a `Trail` of the newest values, index 0 being the last
//! candle. `None` marks an undefined value (warmup, or a window that touches
//! undefined inputs).

use std::fmt;
use std::str::FromStr;

/// Number of trailing values kept per field.
pub const SNAPSHOT_DEPTH: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trail {
    values: Vec<Option<f64>>,
}

impl Trail {
    /// Take the newest `SNAPSHOT_DEPTH` values of a chronological column.
    pub fn from_column(column: &[Option<f64>]) -> Self {
        let values = column.iter().rev().take(SNAPSHOT_DEPTH).copied().collect();
        Self { values }
    }

    /// Build from values already ordered newest first.
    pub fn newest_first(values: Vec<Option<f64>>) -> Self {
        let mut values = values;
        values.truncate(SNAPSHOT_DEPTH);
        Self { values }
    }

    /// Value `lag` candles back; `None` if undefined or out of range.
    pub fn get(&self, lag: usize) -> Option<f64> {
        self.values.get(lag).copied().flatten()
    }

    pub fn latest(&self) -> Option<f64> {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Named snapshot fields addressable from the rule language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Close,
    Adx,
    PlusDi,
    MinusDi,
    Rsi,
    RsiMa,
    Macd,
    Signal,
    Hist,
    ConversionLine,
    BaseLine,
    Ema3,
    Sma3,
    Ema5,
    Sma6,
    Sma20,
    Sma33,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::Close,
        Field::Adx,
        Field::PlusDi,
        Field::MinusDi,
        Field::Rsi,
        Field::RsiMa,
        Field::Macd,
        Field::Signal,
        Field::Hist,
        Field::ConversionLine,
        Field::BaseLine,
        Field::Ema3,
        Field::Sma3,
        Field::Ema5,
        Field::Sma6,
        Field::Sma20,
        Field::Sma33,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Close => "close",
            Field::Adx => "adx",
            Field::PlusDi => "plus_di",
            Field::MinusDi => "minus_di",
            Field::Rsi => "rsi",
            Field::RsiMa => "rsi_ma",
            Field::Macd => "macd",
            Field::Signal => "signal",
            Field::Hist => "hist",
            Field::ConversionLine => "conversion_line",
            Field::BaseLine => "base_line",
            Field::Ema3 => "ema3",
            Field::Sma3 => "sma3",
            Field::Ema5 => "ema5",
            Field::Sma6 => "sma6",
            Field::Sma20 => "sma20",
            Field::Sma33 => "sma33",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field '{}'", self.0)
    }
}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Field::ALL
            .into_iter()
            .find(|f| f.name() == lower)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: Trail,
    pub adx: Trail,
    pub plus_di: Trail,
    pub minus_di: Trail,
    pub rsi: Trail,
    pub rsi_ma: Trail,
    pub macd: Trail,
    pub signal: Trail,
    pub hist: Trail,
    pub conversion_line: Trail,
    pub base_line: Trail,
    pub ema3: Trail,
    pub sma3: Trail,
    pub ema5: Trail,
    pub sma6: Trail,
    pub sma20: Trail,
    pub sma33: Trail,
}

impl IndicatorSnapshot {
    /// Every field undefined.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn trail(&self, field: Field) -> &Trail {
        match field {
            Field::Close => &self.close,
            Field::Adx => &self.adx,
            Field::PlusDi => &self.plus_di,
            Field::MinusDi => &self.minus_di,
            Field::Rsi => &self.rsi,
            Field::RsiMa => &self.rsi_ma,
            Field::Macd => &self.macd,
            Field::Signal => &self.signal,
            Field::Hist => &self.hist,
            Field::ConversionLine => &self.conversion_line,
            Field::BaseLine => &self.base_line,
            Field::Ema3 => &self.ema3,
            Field::Sma3 => &self.sma3,
            Field::Ema5 => &self.ema5,
            Field::Sma6 => &self.sma6,
            Field::Sma20 => &self.sma20,
            Field::Sma33 => &self.sma33,
        }
    }

    pub fn trail_mut(&mut self, field: Field) -> &mut Trail {
        match field {
            Field::Close => &mut self.close,
            Field::Adx => &mut self.adx,
            Field::PlusDi => &mut self.plus_di,
            Field::MinusDi => &mut self.minus_di,
            Field::Rsi => &mut self.rsi,
            Field::RsiMa => &mut self.rsi_ma,
            Field::Macd => &mut self.macd,
            Field::Signal => &mut self.signal,
            Field::Hist => &mut self.hist,
            Field::ConversionLine => &mut self.conversion_line,
            Field::BaseLine => &mut self.base_line,
            Field::Ema3 => &mut self.ema3,
            Field::Sma3 => &mut self.sma3,
            Field::Ema5 => &mut self.ema5,
            Field::Sma6 => &mut self.sma6,
            Field::Sma20 => &mut self.sma20,
            Field::Sma33 => &mut self.sma33,
        }
    }

    /// Builder used by tests and the `score` command: set a field from
    /// newest-first values.
    pub fn with(mut self, field: Field, newest_first: &[f64]) -> Self {
        let values = newest_first.iter().map(|v| Some(*v)).collect();
        *self.trail_mut(field) = Trail::newest_first(values);
        self
    }

    pub fn get(&self, field: Field, lag: usize) -> Option<f64> {
        self.trail(field).get(lag)
    }
}
