//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded on the first valid MACD values
//! Histogram = MACD Line - Signal Line
//!
//! Warmup: max(fast, slow) - 1 + signal - 1 bars

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::ema_values;
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let mut signal_line: Vec<Option<f64>> = vec![None; bars.len()];
    if let Some(first) = macd_line.iter().position(Option::is_some) {
        let tail: Vec<f64> = macd_line[first..].iter().map(|v| v.unwrap_or(0.0)).collect();
        for (offset, value) in ema_values(&tail, signal_period).into_iter().enumerate() {
            signal_line[first + offset] = value;
        }
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let (valid, line, signal) = match (macd_line[i], signal_line[i]) {
                (Some(line), Some(signal)) => (true, line, signal),
                (line, _) => (false, line.unwrap_or(0.0), 0.0),
            };
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid,
                value: IndicatorValue::Macd {
                    line,
                    signal,
                    histogram: line - signal,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn rising(count: usize) -> Vec<OhlcvBar> {
        let prices: Vec<f64> = (0..count).map(|i| 100.0 + i as f64).collect();
        make_bars(&prices)
    }

    #[test]
    fn macd_warmup_standard_lengths() {
        let bars = rising(40);
        let series = calculate_macd(&bars, 12, 26, 9);

        let warmup = 26 - 1 + 9 - 1;
        for i in 0..warmup {
            assert!(!series.values[i].valid, "Index {} should not be valid", i);
        }
        assert!(
            series.values[warmup].valid,
            "Index {} should be valid",
            warmup
        );
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let bars = rising(40);
        let (line, signal, hist) = calculate_macd(&bars, 12, 26, 9).macd_columns();

        for i in 0..bars.len() {
            if let (Some(l), Some(s), Some(h)) = (line[i], signal[i], hist[i]) {
                assert!((h - (l - s)).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]);
        let series = calculate_macd(&bars, 3, 5, 2);

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let ema_fast = ema_values(&closes, 3);
        let ema_slow = ema_values(&closes, 5);

        for (i, point) in series.values.iter().enumerate().skip(4) {
            if let IndicatorValue::Macd { line, .. } = point.value {
                let expected_line = ema_fast[i].unwrap() - ema_slow[i].unwrap();
                assert!(
                    (line - expected_line).abs() < f64::EPSILON,
                    "MACD line mismatch at index {}",
                    i
                );
            }
        }
    }

    #[test]
    fn macd_signal_seeded_with_mean_of_first_lines() {
        let bars = make_bars(&[10.0, 12.0, 11.0, 15.0, 14.0, 18.0, 17.0, 21.0]);
        let (line, signal, _) = calculate_macd(&bars, 2, 3, 3).macd_columns();

        // line valid from index 2, signal seeded over lines 2..=4
        let seed = (line[2].unwrap() + line[3].unwrap() + line[4].unwrap()) / 3.0;
        assert_eq!(signal[3], None);
        assert!((signal[4].unwrap() - seed).abs() < 1e-12);

        let k = 2.0 / 4.0;
        let next = line[5].unwrap() * k + seed * (1.0 - k);
        assert!((signal[5].unwrap() - next).abs() < 1e-12);
    }

    #[test]
    fn macd_indicator_type() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let series = calculate_macd(&bars, 5, 10, 3);

        assert_eq!(
            series.indicator_type,
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 3
            }
        );
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn macd_empty_bars() {
        let bars: Vec<OhlcvBar> = vec![];
        let series = calculate_macd(&bars, 12, 26, 9);
        assert!(series.values.is_empty());
    }

    #[test]
    fn macd_zero_period() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);

        assert!(calculate_macd(&bars, 0, 26, 9).values.is_empty());
        assert!(calculate_macd(&bars, 12, 0, 9).values.is_empty());
        assert!(calculate_macd(&bars, 12, 26, 0).values.is_empty());
    }

    #[test]
    fn macd_custom_parameters() {
        let bars = rising(20);
        let series = calculate_macd(&bars, 5, 10, 3);

        let warmup = 10 - 1 + 3 - 1;
        assert!(!series.values[warmup - 1].valid);
        assert!(series.values[warmup].valid);
    }
}
