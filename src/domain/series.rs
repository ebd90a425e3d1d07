//! Immutable candle window for one symbol/timeframe.

use crate::domain::error::ScannerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::timeframe::Timeframe;

/// Default number of bars requested from the data port.
pub const DEFAULT_FETCH_LIMIT: usize = 200;

/// Shortest series the indicator bank will score.
pub const MIN_SERIES_LEN: usize = 60;

#[derive(Debug, Clone)]
pub struct Series {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<OhlcvBar>,
}

impl Series {
    /// Validates strictly increasing timestamps and finite prices.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<OhlcvBar>,
    ) -> Result<Self, ScannerError> {
        let symbol = symbol.into();

        if let Some(i) = bars.iter().position(|b| !b.is_finite()) {
            return Err(ScannerError::MalformedSeries {
                symbol,
                timeframe: timeframe.label,
                reason: format!("non-finite value in bar {i}"),
            });
        }

        if let Some(i) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(ScannerError::MalformedSeries {
                reason: format!(
                    "timestamp {} at bar {} does not follow {}",
                    bars[i + 1].timestamp,
                    i + 1,
                    bars[i].timestamp
                ),
                symbol,
                timeframe: timeframe.label,
            });
        }

        Ok(Self {
            symbol,
            timeframe,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> &Timeframe {
        &self.timeframe
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}
