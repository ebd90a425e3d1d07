//! Midpoint of the highest high and lowest low over n bars.
//!
//! Conversion and base lines of the cloud indicator are both midranges.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{rolling_max, rolling_min, series_from_values};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_midrange(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::MidRange(period));
    }

    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let values: Vec<Option<f64>> = rolling_max(&highs, period)
        .into_iter()
        .zip(rolling_min(&lows, period))
        .map(|(hi, lo)| Some((hi? + lo?) / 2.0))
        .collect();

    series_from_values(bars, &values, IndicatorType::MidRange(period))
}
