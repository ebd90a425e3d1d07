//! Market data port trait.

use crate::domain::error::ScannerError;
use crate::domain::market::Market;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::timeframe::Timeframe;

/// Bars plus the venue they came from, when the port knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub bars: Vec<OhlcvBar>,
    pub market: Option<Market>,
}

/// Source of candles. Shared across ranking workers, hence `Send + Sync`.
pub trait MarketDataPort: Send + Sync {
    /// Most recent window of at most `limit` bars, oldest first.
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &Timeframe,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, ScannerError>;

    fn list_symbols(&self) -> Result<Vec<String>, ScannerError>;

    /// Like `fetch_bars`, tagged with the venue. Single-venue ports leave it unset.
    fn fetch_tagged(
        &self,
        symbol: &str,
        timeframe: &Timeframe,
        limit: usize,
    ) -> Result<Fetched, ScannerError> {
        Ok(Fetched {
            bars: self.fetch_bars(symbol, timeframe, limit)?,
            market: None,
        })
    }
}
