//! Condition evaluation against an indicator snapshot.
//!
//! # Evaluation Semantics
//!
//! - Lag 0 is the last candle; an operand `a[k]` reads k candles further back
//! - Any undefined operand makes the enclosing comparison `false`
//! - `RISING(a)`: `a > a[1]`
//! - `FALLING(a, n)`: `a < a[1] < ... < a[n-1]`
//! - `CROSS_ABOVE(a, b, w)`: for some `i < w`, `a[i] > b[i]` and `a[i+1] <= b[i+1]`
//! - `AND`: Short-circuits on first `false`
//! - `OR`: Short-circuits on first `true`

use crate::domain::rule::{Condition, Operand};
use crate::domain::snapshot::IndicatorSnapshot;

pub fn evaluate(condition: &Condition, snapshot: &IndicatorSnapshot) -> bool {
    match condition {
        Condition::Above { left, right } => compare(snapshot, left, right, |l, r| l > r),
        Condition::Below { left, right } => compare(snapshot, left, right, |l, r| l < r),
        Condition::AtLeast { left, right } => compare(snapshot, left, right, |l, r| l >= r),
        Condition::AtMost { left, right } => compare(snapshot, left, right, |l, r| l <= r),
        Condition::Rising(operand) => {
            match (resolve(operand, snapshot, 0), resolve(operand, snapshot, 1)) {
                (Some(curr), Some(prev)) => curr > prev,
                _ => false,
            }
        }
        Condition::Falling { operand, points } => {
            if *points < 2 {
                return false;
            }
            (0..points - 1).all(|k| {
                match (resolve(operand, snapshot, k), resolve(operand, snapshot, k + 1)) {
                    (Some(newer), Some(older)) => newer < older,
                    _ => false,
                }
            })
        }
        Condition::CrossAbove {
            left,
            right,
            window,
        } => (0..*window).any(|i| crossed(snapshot, left, right, i, |l, r| l > r)),
        Condition::CrossBelow {
            left,
            right,
            window,
        } => (0..*window).any(|i| crossed(snapshot, left, right, i, |l, r| l < r)),
        Condition::And(children) => children.iter().all(|c| evaluate(c, snapshot)),
        Condition::Or(children) => children.iter().any(|c| evaluate(c, snapshot)),
        Condition::Not(inner) => !evaluate(inner, snapshot),
    }
}

fn resolve(operand: &Operand, snapshot: &IndicatorSnapshot, extra_lag: usize) -> Option<f64> {
    match operand {
        Operand::Constant(v) => Some(*v),
        Operand::Field { field, lag } => snapshot.get(*field, lag.saturating_add(extra_lag)),
    }
}

fn compare(
    snapshot: &IndicatorSnapshot,
    left: &Operand,
    right: &Operand,
    op: fn(f64, f64) -> bool,
) -> bool {
    match (resolve(left, snapshot, 0), resolve(right, snapshot, 0)) {
        (Some(l), Some(r)) => op(l, r),
        _ => false,
    }
}

/// `side` holds at lag `i` and did not hold at lag `i + 1`.
fn crossed(
    snapshot: &IndicatorSnapshot,
    left: &Operand,
    right: &Operand,
    i: usize,
    side: fn(f64, f64) -> bool,
) -> bool {
    let values = (
        resolve(left, snapshot, i),
        resolve(right, snapshot, i),
        resolve(left, snapshot, i + 1),
        resolve(right, snapshot, i + 1),
    );
    match values {
        (Some(l_curr), Some(r_curr), Some(l_prev), Some(r_prev)) => {
            side(l_curr, r_curr) && !side(l_prev, r_prev)
        }
        _ => false,
    }
}
