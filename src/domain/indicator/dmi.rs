//! Directional Movement Index: ADX, +DI and -DI with Wilder smoothing.
//!
//! 1. +DM / -DM from consecutive highs and lows, true range against prior close
//! 2. Smooth +DM, -DM and TR over n changes (see `Smoothing`)
//! 3. +DI = 100 * sm(+DM) / sm(TR), -DI = 100 * sm(-DM) / sm(TR)
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = DX smoothed the same way over n values
//!
//! A zero smoothed true range gives +DI = -DI = 0.
//!
//! Warmup: DI valid from bar n, ADX valid from bar 2n - 1.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{Smoothing, series_from_values};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone)]
pub struct DmiOutput {
    pub adx: IndicatorSeries,
    pub plus_di: IndicatorSeries,
    pub minus_di: IndicatorSeries,
}

impl DmiOutput {
    fn empty(period: usize) -> Self {
        Self {
            adx: IndicatorSeries::empty(IndicatorType::Adx(period)),
            plus_di: IndicatorSeries::empty(IndicatorType::PlusDi(period)),
            minus_di: IndicatorSeries::empty(IndicatorType::MinusDi(period)),
        }
    }
}

pub fn calculate_dmi(bars: &[OhlcvBar], period: usize, smoothing: Smoothing) -> DmiOutput {
    if period == 0 || bars.is_empty() {
        return DmiOutput::empty(period);
    }

    let changes = bars.len() - 1;
    let mut plus_dm = Vec::with_capacity(changes);
    let mut minus_dm = Vec::with_capacity(changes);
    let mut tr = Vec::with_capacity(changes);

    for pair in bars.windows(2) {
        let (prev, bar) = (&pair[0], &pair[1]);
        let up_move = bar.high - prev.high;
        let down_move = prev.low - bar.low;

        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
        tr.push(bar.true_range(prev.close));
    }

    let sm_plus = smoothing.apply(&plus_dm, period);
    let sm_minus = smoothing.apply(&minus_dm, period);
    let sm_tr = smoothing.apply(&tr, period);

    // index 0 has no prior bar
    let mut plus_di = vec![None; bars.len()];
    let mut minus_di = vec![None; bars.len()];
    let mut dx = Vec::with_capacity(changes);

    for j in 0..changes {
        let (Some(p), Some(m), Some(t)) = (sm_plus[j], sm_minus[j], sm_tr[j]) else {
            continue;
        };
        let (pdi, mdi) = if t > 0.0 {
            (100.0 * p / t, 100.0 * m / t)
        } else {
            (0.0, 0.0)
        };
        plus_di[j + 1] = Some(pdi);
        minus_di[j + 1] = Some(mdi);

        let total = pdi + mdi;
        dx.push(if total > 0.0 {
            100.0 * (pdi - mdi).abs() / total
        } else {
            0.0
        });
    }

    // dx[0] lines up with bar `period`
    let mut adx = vec![None; bars.len()];
    for (offset, value) in smoothing.apply(&dx, period).into_iter().enumerate() {
        adx[period + offset] = value;
    }

    DmiOutput {
        adx: series_from_values(bars, &adx, IndicatorType::Adx(period)),
        plus_di: series_from_values(bars, &plus_di, IndicatorType::PlusDi(period)),
        minus_di: series_from_values(bars, &minus_di, IndicatorType::MinusDi(period)),
    }
}
