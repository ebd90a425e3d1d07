//! RSI (Relative Strength Index) indicator implementation.
//!
//! Gains and losses of consecutive closes are smoothed separately (see
//! `Smoothing`), then RSI = 100 * avg_gain / (avg_gain + avg_loss).
//! A window with neither gains nor losses has no RSI.
//!
//! Warmup: first n bars are invalid (need n price changes).

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{Smoothing, series_from_values};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize, smoothing: Smoothing) -> IndicatorSeries {
    let mut rsi = vec![None; bars.len()];
    if period == 0 || bars.len() < 2 {
        return series_from_values(bars, &rsi, IndicatorType::Rsi(period));
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = bars
        .windows(2)
        .map(|pair| {
            let change = pair[1].close - pair[0].close;
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let avg_gain = smoothing.apply(&gains, period);
    let avg_loss = smoothing.apply(&losses, period);

    // change j ends at bar j + 1
    for (j, (gain, loss)) in avg_gain.into_iter().zip(avg_loss).enumerate() {
        if let (Some(gain), Some(loss)) = (gain, loss) {
            rsi[j + 1] = rsi_from_averages(gain, loss);
        }
    }

    series_from_values(bars, &rsi, IndicatorType::Rsi(period))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let total = avg_gain + avg_loss;
    (total > 0.0).then(|| 100.0 * avg_gain / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::fixtures::reference_bars;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bar(date: &str, close: f64) -> OhlcvBar {
        OhlcvBar {
            timestamp: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        }
    }

    fn closes(prices: impl Iterator<Item = f64>) -> Vec<OhlcvBar> {
        prices
            .enumerate()
            .map(|(i, close)| make_bar(&format!("2024-01-{:02}", i + 1), close))
            .collect()
    }

    #[test]
    fn rsi_empty_bars() {
        let bars: Vec<OhlcvBar> = vec![];
        let series = calculate_rsi(&bars, 14, Smoothing::Rma);
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_single_bar() {
        let bars = vec![make_bar("2024-01-01", 100.0)];
        let series = calculate_rsi(&bars, 14, Smoothing::Rma);
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].valid);
    }

    #[test]
    fn rsi_warmup_period() {
        let bars = closes((1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0));
        let series = calculate_rsi(&bars, 14, Smoothing::Rma);

        assert_eq!(series.values.len(), 15);
        for i in 0..14 {
            assert!(!series.values[i].valid, "Bar {} should be invalid", i);
        }
        assert!(series.values[14].valid, "Bar 14 should be valid");
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let bars = closes((0..15).map(|i| 100.0 + i as f64));
        let series = calculate_rsi(&bars, 14, Smoothing::Rma);

        assert_eq!(series.simple_values()[14], Some(100.0));
    }

    #[test]
    fn rsi_flat_window_is_undefined() {
        let bars = closes((0..20).map(|_| 50.0));
        let series = calculate_rsi(&bars, 14, Smoothing::Rma);

        assert_eq!(series.simple_values()[19], None);
        assert!(!series.values[19].valid);
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let bars = closes((0..15).map(|i| 100.0 - i as f64));
        let series = calculate_rsi(&bars, 14, Smoothing::Rma);

        let rsi = series.simple_values()[14].unwrap();
        assert!(rsi.abs() < f64::EPSILON, "RSI should be 0 when all losses");
    }

    #[test]
    fn rsi_in_range() {
        let bars = closes((1..=20).map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0));
        let series = calculate_rsi(&bars, 14, Smoothing::Rma);

        for rsi in series.simple_values().into_iter().flatten() {
            assert!((0.0..=100.0).contains(&rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let bars = vec![make_bar("2024-01-01", 100.0), make_bar("2024-01-02", 101.0)];
        let series = calculate_rsi(&bars, 0, Smoothing::Rma);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn rsi_known_calculation() {
        let bars = closes(
            [
                44.0, 44.25, 44.50, 43.75, 44.50, 44.25, 44.75, 45.25, 45.50, 45.25, 45.50, 46.0,
                46.25, 46.0, 46.50,
            ]
            .into_iter(),
        );

        let series = calculate_rsi(&bars, 14, Smoothing::Wilder);

        // gains 4.0 / losses 1.5 over 14 changes
        let expected = 100.0 * 4.0 / 5.5;
        let rsi = series.simple_values()[14].unwrap();
        assert!((rsi - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_rma_matches_reference() {
        let bars = reference_bars();
        let rsi = calculate_rsi(&bars, 14, Smoothing::Rma).simple_values();

        assert_eq!(rsi[13], None);
        assert_relative_eq!(rsi[14].unwrap(), 43.838520548100156, epsilon = 1e-9);
        assert_relative_eq!(rsi[30].unwrap(), 56.112788078884606, epsilon = 1e-9);
        assert_relative_eq!(rsi[59].unwrap(), 46.775901002558896, epsilon = 1e-9);
    }

    #[test]
    fn rsi_wilder_seed_differs_from_rma() {
        let bars = reference_bars();
        let rma = calculate_rsi(&bars, 14, Smoothing::Rma).simple_values();
        let wilder = calculate_rsi(&bars, 14, Smoothing::Wilder).simple_values();

        assert!(wilder[14].is_some());
        assert!((rma[59].unwrap() - wilder[59].unwrap()).abs() > 1e-6);
    }
}
