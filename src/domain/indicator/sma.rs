//! Simple Moving Average of close.
//!
//! SMA(n)[i] = sum(C[i-n+1..=i]) / n. Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{series_from_values, sma_values};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Sma(period));
    }

    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    series_from_values(bars, &sma_values(&closes, period), IndicatorType::Sma(period))
}
