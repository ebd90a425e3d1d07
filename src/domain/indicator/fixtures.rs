//! Sixty-bar OHLC fixture with reference values computed independently using
//! the adjusted exponential mean (alpha = 1/14) over gains, losses, true range
//! and directional movement.

use chrono::{Duration, NaiveDate};

use crate::domain::ohlcv::OhlcvBar;

const HIGHS: [f64; 60] = [
    101.99, 101.05, 101.98, 99.87, 100.01, 100.0, 100.42, 99.81, 98.65, 97.93,
    99.58, 98.0, 96.91, 97.66, 99.12, 101.44, 103.02, 102.89, 102.99, 103.69,
    102.44, 103.39, 104.55, 107.11, 106.1, 105.85, 107.01, 108.19, 106.47, 103.94,
    105.31, 102.94, 103.5, 102.08, 102.41, 102.54, 101.92, 100.35, 101.13, 102.12,
    101.18, 103.62, 105.25, 104.72, 105.84, 103.76, 104.37, 104.67, 105.61, 107.8,
    107.29, 108.97, 109.67, 107.07, 106.3, 104.28, 104.64, 103.86, 102.09, 103.69,
];

const LOWS: [f64; 60] = [
    99.57, 98.56, 99.38, 97.39, 97.58, 97.5, 97.96, 97.28, 96.21, 95.57,
    97.09, 95.46, 94.61, 95.25, 96.6, 98.92, 100.53, 100.31, 100.47, 101.06,
    99.92, 100.89, 101.94, 104.35, 103.58, 103.26, 104.29, 105.51, 103.9, 101.34,
    102.73, 100.33, 100.94, 99.62, 99.86, 99.9, 99.5, 97.88, 98.55, 99.58,
    98.73, 101.02, 102.67, 102.07, 103.24, 101.26, 101.76, 101.97, 103.11, 105.15,
    104.57, 106.27, 107.02, 104.39, 103.7, 101.63, 102.06, 101.36, 99.54, 101.01,
];

const CLOSES: [f64; 60] = [
    100.78, 99.8, 100.67, 98.69, 98.77, 98.72, 99.23, 98.58, 97.38, 96.77,
    98.35, 96.74, 95.76, 96.45, 97.85, 100.24, 101.75, 101.57, 101.77, 102.41,
    101.13, 102.16, 103.26, 105.74, 104.84, 104.55, 105.64, 106.91, 105.16, 102.61,
    104.06, 101.67, 102.17, 100.87, 101.15, 101.23, 100.71, 99.11, 99.83, 100.91,
    99.93, 102.29, 104.0, 103.43, 104.49, 102.53, 103.08, 103.33, 104.36, 106.47,
    105.92, 107.68, 108.32, 105.7, 105.04, 102.99, 103.3, 102.63, 100.83, 102.36,
];

pub fn reference_bars() -> Vec<OhlcvBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..CLOSES.len())
        .map(|i| OhlcvBar {
            timestamp: start + Duration::days(i as i64),
            open: CLOSES[i.saturating_sub(1)],
            high: HIGHS[i],
            low: LOWS[i],
            close: CLOSES[i],
            volume: 1000.0,
        })
        .collect()
}
