//! Scoring rule AST and rule tables.
//!
//! - `Operand`: a constant or a (possibly lagged) snapshot field
//! - `Condition`: comparison, trend, crossover and boolean variants
//! - `ScoreRule`: a named condition with a weight, or an ordered list of tiers
//! - `RuleSet`: the ordered, validated rule table

use std::fmt;

use crate::domain::error::ScannerError;
use crate::domain::snapshot::{Field, SNAPSHOT_DEPTH};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Constant(f64),
    Field { field: Field, lag: usize },
}

impl Operand {
    pub fn field(field: Field) -> Self {
        Operand::Field { field, lag: 0 }
    }

    /// Deepest lag read by this operand.
    fn depth(&self) -> usize {
        match self {
            Operand::Constant(_) => 0,
            Operand::Field { lag, .. } => *lag,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Above { left: Operand, right: Operand },
    Below { left: Operand, right: Operand },
    AtLeast { left: Operand, right: Operand },
    AtMost { left: Operand, right: Operand },
    Rising(Operand),
    Falling { operand: Operand, points: usize },
    CrossAbove {
        left: Operand,
        right: Operand,
        window: usize,
    },
    CrossBelow {
        left: Operand,
        right: Operand,
        window: usize,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn above(left: Field, right: impl Into<Operand>) -> Self {
        Condition::Above {
            left: Operand::field(left),
            right: right.into(),
        }
    }

    pub fn below(left: Field, right: impl Into<Operand>) -> Self {
        Condition::Below {
            left: Operand::field(left),
            right: right.into(),
        }
    }

    pub fn at_least(left: Field, right: impl Into<Operand>) -> Self {
        Condition::AtLeast {
            left: Operand::field(left),
            right: right.into(),
        }
    }

    pub fn rising(field: Field) -> Self {
        Condition::Rising(Operand::field(field))
    }

    pub fn cross_above(left: Field, right: Field, window: usize) -> Self {
        Condition::CrossAbove {
            left: Operand::field(left),
            right: Operand::field(right),
            window,
        }
    }

    /// Deepest snapshot index the condition reads.
    pub fn max_lag(&self) -> usize {
        match self {
            Condition::Above { left, right }
            | Condition::Below { left, right }
            | Condition::AtLeast { left, right }
            | Condition::AtMost { left, right } => left.depth().max(right.depth()),
            Condition::Rising(operand) => operand.depth().saturating_add(1),
            Condition::Falling { operand, points } => {
                operand.depth().saturating_add(points.saturating_sub(1))
            }
            Condition::CrossAbove {
                left,
                right,
                window,
            }
            | Condition::CrossBelow {
                left,
                right,
                window,
            } => left.depth().max(right.depth()).saturating_add(*window),
            Condition::And(children) | Condition::Or(children) => {
                children.iter().map(Condition::max_lag).max().unwrap_or(0)
            }
            Condition::Not(inner) => inner.max_lag(),
        }
    }

    /// Structural checks beyond the grammar: window sizes and lag depth.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Condition::Falling { points, .. } if *points < 2 => {
                return Err(format!("FALLING needs at least 2 points, got {points}"));
            }
            Condition::CrossAbove { window, .. } | Condition::CrossBelow { window, .. }
                if *window == 0 =>
            {
                return Err("crossover window must be at least 1".to_string());
            }
            Condition::And(children) | Condition::Or(children) => {
                for child in children {
                    child.validate()?;
                }
            }
            Condition::Not(inner) => inner.validate()?,
            _ => {}
        }

        let depth = self.max_lag();
        if depth >= SNAPSHOT_DEPTH {
            return Err(format!(
                "reads {} candles back, snapshot keeps {}",
                depth, SNAPSHOT_DEPTH
            ));
        }
        Ok(())
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Constant(value)
    }
}

impl From<Field> for Operand {
    fn from(field: Field) -> Self {
        Operand::field(field)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(v) => write!(f, "{}", v),
            Operand::Field { field, lag: 0 } => write!(f, "{}", field),
            Operand::Field { field, lag } => write!(f, "{}[{}]", field, lag),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, items: &[Condition]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, ")")
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Above { left, right } => write!(f, "ABOVE({}, {})", left, right),
            Condition::Below { left, right } => write!(f, "BELOW({}, {})", left, right),
            Condition::AtLeast { left, right } => write!(f, "AT_LEAST({}, {})", left, right),
            Condition::AtMost { left, right } => write!(f, "AT_MOST({}, {})", left, right),
            Condition::Rising(operand) => write!(f, "RISING({})", operand),
            Condition::Falling { operand, points } => {
                write!(f, "FALLING({}, {})", operand, points)
            }
            Condition::CrossAbove {
                left,
                right,
                window,
            } => write!(f, "CROSS_ABOVE({}, {}, {})", left, right, window),
            Condition::CrossBelow {
                left,
                right,
                window,
            } => write!(f, "CROSS_BELOW({}, {}, {})", left, right, window),
            Condition::And(children) => write_list(f, "AND", children),
            Condition::Or(children) => write_list(f, "OR", children),
            Condition::Not(inner) => write!(f, "NOT({})", inner),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub condition: Condition,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    Weighted { condition: Condition, weight: u32 },
    /// First matching tier wins.
    Tiered(Vec<Tier>),
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Weighted { condition, weight } => write!(f, "{} => {}", condition, weight),
            RuleKind::Tiered(tiers) => {
                write!(f, "FIRST(")?;
                for (i, tier) in tiers.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => {}", tier.condition, tier.weight)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRule {
    pub name: String,
    pub kind: RuleKind,
}

impl ScoreRule {
    pub fn weighted(name: &str, condition: Condition, weight: u32) -> Self {
        Self {
            name: name.to_string(),
            kind: RuleKind::Weighted { condition, weight },
        }
    }

    pub fn tiered(name: &str, tiers: Vec<(Condition, u32)>) -> Self {
        Self {
            name: name.to_string(),
            kind: RuleKind::Tiered(
                tiers
                    .into_iter()
                    .map(|(condition, weight)| Tier { condition, weight })
                    .collect(),
            ),
        }
    }

    /// Largest weight this rule can award.
    pub fn max_weight(&self) -> u32 {
        match &self.kind {
            RuleKind::Weighted { weight, .. } => *weight,
            RuleKind::Tiered(tiers) => tiers.iter().map(|t| t.weight).max().unwrap_or(0),
        }
    }

    fn validate(&self) -> Result<(), ScannerError> {
        let invalid = |reason: String| ScannerError::RuleInvalid {
            reason: format!("{}: {}", self.name, reason),
        };
        match &self.kind {
            RuleKind::Weighted { condition, .. } => condition.validate().map_err(invalid),
            RuleKind::Tiered(tiers) if tiers.is_empty() => {
                Err(invalid("FIRST needs at least one tier".to_string()))
            }
            RuleKind::Tiered(tiers) => tiers
                .iter()
                .try_for_each(|t| t.condition.validate())
                .map_err(invalid),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<ScoreRule>,
}

impl RuleSet {
    /// Validates every rule and rejects duplicate names.
    pub fn new(rules: Vec<ScoreRule>) -> Result<Self, ScannerError> {
        if rules.is_empty() {
            return Err(ScannerError::RuleInvalid {
                reason: "rule set is empty".to_string(),
            });
        }
        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|r| r.name == rule.name) {
                return Err(ScannerError::RuleInvalid {
                    reason: format!("duplicate rule name '{}'", rule.name),
                });
            }
            rule.validate()?;
        }
        if rules
            .iter()
            .try_fold(0u32, |total, rule| total.checked_add(rule.max_weight()))
            .is_none()
        {
            return Err(ScannerError::RuleInvalid {
                reason: format!("maximum score exceeds {}", u32::MAX),
            });
        }
        Ok(Self { rules })
    }

    /// The default trend-strength table. Maximum score 156.
    pub fn canonical() -> Self {
        use Field::*;

        let rules = vec![
            // trend strength
            ScoreRule::weighted("adx_above_19", Condition::above(Adx, 19.0), 5),
            ScoreRule::weighted("plus_di_above_19", Condition::above(PlusDi, 19.0), 5),
            ScoreRule::weighted("adx_above_30", Condition::above(Adx, 30.0), 10),
            ScoreRule::weighted("plus_di_above_30", Condition::above(PlusDi, 30.0), 10),
            ScoreRule::weighted(
                "directional_rising",
                Condition::Or(vec![Condition::rising(PlusDi), Condition::rising(Adx)]),
                5,
            ),
            ScoreRule::weighted("minus_di_below_17", Condition::below(MinusDi, 17.0), 5),
            ScoreRule::weighted("minus_di_below_10", Condition::below(MinusDi, 10.0), 5),
            ScoreRule::weighted(
                "minus_di_falling",
                Condition::Falling {
                    operand: Operand::field(MinusDi),
                    points: 3,
                },
                5,
            ),
            // rsi
            ScoreRule::weighted("rsi_above_50", Condition::above(Rsi, 50.0), 10),
            ScoreRule::weighted("rsi_below_83", Condition::below(Rsi, 83.0), 5),
            ScoreRule::weighted("rsi_above_ma", Condition::above(Rsi, RsiMa), 5),
            ScoreRule::weighted("rsi_ma_below_55", Condition::below(RsiMa, 55.0), 5),
            // macd
            ScoreRule::weighted("hist_non_negative", Condition::at_least(Hist, 0.0), 5),
            ScoreRule::weighted("hist_rising", Condition::rising(Hist), 5),
            ScoreRule::weighted("macd_above_signal", Condition::above(Macd, Signal), 5),
            ScoreRule::weighted("macd_above_hist", Condition::above(Macd, Hist), 5),
            ScoreRule::weighted("signal_above_hist", Condition::above(Signal, Hist), 5),
            ScoreRule::weighted(
                "macd_under_hist_positive",
                Condition::And(vec![
                    Condition::below(Macd, Hist),
                    Condition::above(Macd, 0.0),
                ]),
                3,
            ),
            ScoreRule::weighted(
                "macd_under_hist_shallow",
                Condition::And(vec![
                    Condition::below(Macd, Hist),
                    Condition::above(Macd, -0.5),
                ]),
                2,
            ),
            ScoreRule::weighted("hist_above_signal", Condition::above(Hist, Signal), 1),
            ScoreRule::tiered(
                "macd_cross",
                vec![
                    (Condition::cross_above(Macd, Signal, 3), 25),
                    (Condition::cross_above(Macd, Signal, 5), 15),
                    (Condition::cross_above(Macd, Signal, 7), 10),
                ],
            ),
            // structure
            ScoreRule::weighted(
                "conversion_below_ema3",
                Condition::below(ConversionLine, Ema3),
                5,
            ),
            ScoreRule::weighted(
                "conversion_above_short_mas",
                Condition::And(vec![
                    Condition::above(ConversionLine, Sma3),
                    Condition::above(ConversionLine, Ema5),
                    Condition::above(ConversionLine, Sma6),
                ]),
                5,
            ),
            ScoreRule::weighted("base_above_sma6", Condition::above(BaseLine, Sma6), 5),
            // slope
            ScoreRule::weighted("sma20_rising", Condition::rising(Sma20), 5),
            ScoreRule::weighted("sma33_rising", Condition::rising(Sma33), 5),
        ];

        Self { rules }
    }

    pub fn rules(&self) -> &[ScoreRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Sum of every rule's largest weight.
    pub fn max_score(&self) -> u32 {
        self.rules
            .iter()
            .map(ScoreRule::max_weight)
            .fold(0, u32::saturating_add)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::canonical()
    }
}
