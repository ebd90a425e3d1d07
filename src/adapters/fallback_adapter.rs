//! Perpetual-first data port with a spot fallback.
//!
//! The primary (perpetual) port is asked first. The secondary (spot) port is
//! only consulted when the primary fails or returns fewer than `min_bars`
//! candles. If the spot series is no better, the primary outcome stands.
//! The universe always comes from the primary.

use tracing::debug;

use crate::domain::error::ScannerError;
use crate::domain::market::Market;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::timeframe::Timeframe;
use crate::ports::data_port::{Fetched, MarketDataPort};

pub struct FallbackDataPort<P, S> {
    primary: P,
    secondary: S,
    min_bars: usize,
}

impl<P: MarketDataPort, S: MarketDataPort> FallbackDataPort<P, S> {
    pub fn new(primary: P, secondary: S, min_bars: usize) -> Self {
        Self {
            primary,
            secondary,
            min_bars,
        }
    }

    fn long_enough(&self, bars: &[OhlcvBar]) -> bool {
        bars.len() >= self.min_bars
    }
}

impl<P: MarketDataPort, S: MarketDataPort> MarketDataPort for FallbackDataPort<P, S> {
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &Timeframe,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, ScannerError> {
        self.fetch_tagged(symbol, timeframe, limit)
            .map(|fetched| fetched.bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScannerError> {
        self.primary.list_symbols()
    }

    fn fetch_tagged(
        &self,
        symbol: &str,
        timeframe: &Timeframe,
        limit: usize,
    ) -> Result<Fetched, ScannerError> {
        let primary = match self.primary.fetch_bars(symbol, timeframe, limit) {
            Ok(bars) if self.long_enough(&bars) => {
                return Ok(Fetched {
                    bars,
                    market: Some(Market::Perp),
                })
            }
            other => other,
        };
        match &primary {
            Ok(bars) => debug!(symbol, bars = bars.len(), "perp series short, trying spot"),
            Err(e) => debug!(symbol, error = %e, "perp fetch failed, trying spot"),
        }

        match self.secondary.fetch_bars(symbol, timeframe, limit) {
            Ok(bars) if self.long_enough(&bars) => Ok(Fetched {
                bars,
                market: Some(Market::Spot),
            }),
            outcome => {
                if let Err(e) = outcome {
                    debug!(symbol, error = %e, "spot fetch failed");
                }
                primary.map(|bars| Fetched {
                    bars,
                    market: Some(Market::Perp),
                })
            }
        }
    }
}
