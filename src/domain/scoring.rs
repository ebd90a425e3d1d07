//! Rule-weighted trend score.

use crate::domain::rule::{RuleKind, RuleSet, ScoreRule};
use crate::domain::rule_eval::evaluate;
use crate::domain::snapshot::IndicatorSnapshot;

/// A rule that fired and the weight it awarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub name: String,
    pub weight: u32,
    /// Position of the matching tier for tiered rules.
    pub tier: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    rules: RuleSet,
}

impl ScoringEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn max_score(&self) -> u32 {
        self.rules.max_score()
    }

    pub fn score(&self, snapshot: &IndicatorSnapshot) -> u32 {
        self.rules
            .rules()
            .iter()
            .filter_map(|rule| award(rule, snapshot))
            .map(|(weight, _)| weight)
            .fold(0, u32::saturating_add)
    }

    /// Every rule that fired, in table order.
    pub fn breakdown(&self, snapshot: &IndicatorSnapshot) -> Vec<RuleHit> {
        self.rules
            .rules()
            .iter()
            .filter_map(|rule| {
                award(rule, snapshot).map(|(weight, tier)| RuleHit {
                    name: rule.name.clone(),
                    weight,
                    tier,
                })
            })
            .collect()
    }
}

fn award(rule: &ScoreRule, snapshot: &IndicatorSnapshot) -> Option<(u32, Option<usize>)> {
    match &rule.kind {
        RuleKind::Weighted { condition, weight } => {
            evaluate(condition, snapshot).then_some((*weight, None))
        }
        RuleKind::Tiered(tiers) => tiers
            .iter()
            .position(|tier| evaluate(&tier.condition, snapshot))
            .map(|i| (tiers[i].weight, Some(i))),
    }
}
