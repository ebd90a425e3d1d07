//! Computes the fixed indicator set for a series and extracts the snapshot.

use crate::domain::error::ScannerError;
use crate::domain::indicator::{
    calculate_dmi, calculate_ema, calculate_macd, calculate_midrange, calculate_rsi,
    calculate_sma,
};
use crate::domain::indicator_helpers::{Smoothing, sma_values};
use crate::domain::series::{MIN_SERIES_LEN, Series};
use crate::domain::snapshot::{IndicatorSnapshot, Trail};

/// Tunable indicator lengths and RSI/DMI smoothing. The short trend averages
/// are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorParams {
    pub smoothing: Smoothing,
    pub dmi_length: usize,
    pub rsi_length: usize,
    pub rsi_ma_length: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub conversion_length: usize,
    pub base_length: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            smoothing: Smoothing::Rma,
            dmi_length: 14,
            rsi_length: 14,
            rsi_ma_length: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            conversion_length: 9,
            base_length: 26,
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<(), ScannerError> {
        let lengths = [
            ("dmi_length", self.dmi_length),
            ("rsi_length", self.rsi_length),
            ("rsi_ma_length", self.rsi_ma_length),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("conversion_length", self.conversion_length),
            ("base_length", self.base_length),
        ];
        for (key, value) in lengths {
            if value == 0 {
                return Err(invalid(key, "must be greater than 0"));
            }
        }
        if self.macd_fast >= self.macd_slow {
            return Err(invalid(
                "macd_fast",
                &format!(
                    "must be less than macd_slow ({} >= {})",
                    self.macd_fast, self.macd_slow
                ),
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ScannerError {
    ScannerError::ConfigInvalid {
        section: "indicators".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorBank {
    params: IndicatorParams,
    min_bars: usize,
}

impl Default for IndicatorBank {
    fn default() -> Self {
        Self::new(IndicatorParams::default(), MIN_SERIES_LEN)
    }
}

impl IndicatorBank {
    pub fn new(params: IndicatorParams, min_bars: usize) -> Self {
        Self { params, min_bars }
    }

    /// Fails with `InsufficientData` when the series is shorter than `min_bars`.
    pub fn compute(&self, series: &Series) -> Result<IndicatorSnapshot, ScannerError> {
        if series.len() < self.min_bars {
            return Err(ScannerError::InsufficientData {
                symbol: series.symbol().to_string(),
                timeframe: series.timeframe().label.clone(),
                bars: series.len(),
                minimum: self.min_bars,
            });
        }

        let bars = series.bars();
        let p = &self.params;

        let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
        let dmi = calculate_dmi(bars, p.dmi_length, p.smoothing);
        let rsi = calculate_rsi(bars, p.rsi_length, p.smoothing).simple_values();
        let rsi_ma = sma_values(&rsi, p.rsi_ma_length);
        let (macd, signal, hist) =
            calculate_macd(bars, p.macd_fast, p.macd_slow, p.macd_signal).macd_columns();

        let column = |values: Vec<Option<f64>>| Trail::from_column(&values);

        Ok(IndicatorSnapshot {
            close: Trail::from_column(&closes),
            adx: column(dmi.adx.simple_values()),
            plus_di: column(dmi.plus_di.simple_values()),
            minus_di: column(dmi.minus_di.simple_values()),
            rsi: Trail::from_column(&rsi),
            rsi_ma: Trail::from_column(&rsi_ma),
            macd: Trail::from_column(&macd),
            signal: Trail::from_column(&signal),
            hist: Trail::from_column(&hist),
            conversion_line: column(
                calculate_midrange(bars, p.conversion_length).simple_values(),
            ),
            base_line: column(calculate_midrange(bars, p.base_length).simple_values()),
            ema3: column(calculate_ema(bars, 3).simple_values()),
            sma3: column(calculate_sma(bars, 3).simple_values()),
            ema5: column(calculate_ema(bars, 5).simple_values()),
            sma6: column(calculate_sma(bars, 6).simple_values()),
            sma20: column(calculate_sma(bars, 20).simple_values()),
            sma33: column(calculate_sma(bars, 33).simple_values()),
        })
    }
}
