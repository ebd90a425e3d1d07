//! Shared helper functions for indicator calculations.
//!
//! All helpers return one entry per input; `None` marks a warmup position.

use std::fmt;
use std::str::FromStr;

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

/// Wrap per-bar optional values into a series aligned with `bars`.
pub fn series_from_values(
    bars: &[OhlcvBar],
    values: &[Option<f64>],
    indicator_type: IndicatorType,
) -> IndicatorSeries {
    let values = bars
        .iter()
        .zip(values)
        .map(|(bar, v)| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: v.is_some(),
            value: IndicatorValue::Simple(v.unwrap_or(0.0)),
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// Simple moving average; a window containing any `None` yields `None`.
pub fn sma_values(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i + 1 < period {
            out.push(None);
            continue;
        }
        let window = &values[i + 1 - period..=i];
        let sum: Option<f64> = window.iter().copied().sum();
        out.push(sum.map(|s| s / period as f64));
    }
    out
}

/// k = 2/(n+1), seeded with the SMA of the first n values.
pub fn ema_values(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &v) in values.iter().enumerate() {
        if i < period - 1 {
            sum += v;
            out.push(None);
        } else if i == period - 1 {
            sum += v;
            ema = sum / period as f64;
            out.push(Some(ema));
        } else {
            ema = v * k + ema * (1.0 - k);
            out.push(Some(ema));
        }
    }
    out
}

/// Averaging used by RSI and DMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Smoothing {
    /// Exponentially weighted mean, alpha = 1/n, weights renormalised over
    /// the whole history. Defined once n values have been seen.
    #[default]
    Rma,
    /// Seeded with the mean of the first n values, then
    /// s = (s * (n - 1) + x) / n.
    Wilder,
}

impl Smoothing {
    pub fn apply(self, values: &[f64], period: usize) -> Vec<Option<f64>> {
        match self {
            Smoothing::Rma => rma_values(values, period),
            Smoothing::Wilder => wilder_smooth(values, period),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Smoothing::Rma => "rma",
            Smoothing::Wilder => "wilder",
        }
    }
}

impl fmt::Display for Smoothing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Smoothing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rma" => Ok(Smoothing::Rma),
            "wilder" => Ok(Smoothing::Wilder),
            other => Err(format!("unknown smoothing '{}' (expected rma or wilder)", other)),
        }
    }
}

/// Adjusted exponential mean with alpha = 1/n.
///
/// Updated incrementally as `avg = (w * avg + x) / (w + 1)` where `w` is the
/// decayed weight of the history so far, so results match a batch weighted
/// mean to the last bit.
pub fn rma_values(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let decay = 1.0 - 1.0 / period as f64;
    let mut out = Vec::with_capacity(values.len());
    let mut avg = 0.0;
    let mut weight = 0.0;

    for (i, &v) in values.iter().enumerate() {
        if i == 0 {
            avg = v;
            weight = 1.0;
        } else {
            weight *= decay;
            if avg != v {
                avg = (weight * avg + v) / (weight + 1.0);
            }
            weight += 1.0;
        }
        out.push((i + 1 >= period).then_some(avg));
    }
    out
}

/// Wilder smoothing: seed with the mean of the first n values, then
/// s = (s * (n - 1) + x) / n.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut smoothed = 0.0;

    for (i, &v) in values.iter().enumerate() {
        if i < period - 1 {
            out.push(None);
        } else if i == period - 1 {
            smoothed = values[..period].iter().sum::<f64>() / period as f64;
            out.push(Some(smoothed));
        } else {
            smoothed = (smoothed * (period - 1) as f64 + v) / period as f64;
            out.push(Some(smoothed));
        }
    }
    out
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, f64::max)
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, f64::min)
}

fn rolling(values: &[f64], period: usize, pick: fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                values[i + 1 - period..=i].iter().copied().reduce(pick)
            }
        })
        .collect()
}
