//! Genotype of a robot: numeric trading parameters plus an ordered rule list.

use crate::types::{Action, MarketSnapshot};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const TRADE_PERCENTAGE_RANGE: RangeInclusive<f64> = 0.01..=0.1;
pub const RISK_APPETITE_RANGE: RangeInclusive<f64> = 0.1..=0.9;
pub const MAX_TRADE_DURATION_RANGE: RangeInclusive<u32> = 1..=10;

/// Indicator kinds a condition can inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Indicator {
    Rsi,
    PriceAboveEma,
    PriceBelowEma,
    VolumeRatio,
    TrendAlignment,
}

/// Current value of an indicator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Numeric(f64),
    Flag(bool),
}

impl Indicator {
    pub fn read(self, snapshot: &MarketSnapshot) -> Reading {
        match self {
            Indicator::Rsi => Reading::Numeric(snapshot.rsi),
            Indicator::PriceAboveEma => Reading::Flag(snapshot.current_price > snapshot.ema),
            Indicator::PriceBelowEma => Reading::Flag(snapshot.current_price < snapshot.ema),
            Indicator::VolumeRatio => Reading::Numeric(snapshot.volume_ratio),
            Indicator::TrendAlignment => Reading::Flag(snapshot.trend_aligned),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Lt,
    Gt,
    Eq,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Number(f64),
    Flag(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub indicator: Indicator,
    pub operator: Comparison,
    pub value: Threshold,
    pub action: Action,
}

impl Condition {
    pub const fn new(
        indicator: Indicator,
        operator: Comparison,
        value: Threshold,
        action: Action,
    ) -> Self {
        Self {
            indicator,
            operator,
            value,
            action,
        }
    }

    /// Flags only support equality; mismatched kinds never match
    pub fn holds(&self, snapshot: &MarketSnapshot) -> bool {
        match (self.indicator.read(snapshot), self.operator, self.value) {
            (Reading::Flag(current), Comparison::Eq, Threshold::Flag(expected)) => {
                current == expected
            }
            (Reading::Numeric(current), op, Threshold::Number(target)) => match op {
                Comparison::Lt => current < target,
                Comparison::Gt => current > target,
                Comparison::Eq => current == target,
            },
            _ => false,
        }
    }
}

/// Fixed pool that random trees and mutations draw from
pub const CONDITION_CATALOG: [Condition; 6] = [
    Condition::new(Indicator::Rsi, Comparison::Lt, Threshold::Number(30.0), Action::Buy),
    Condition::new(Indicator::Rsi, Comparison::Gt, Threshold::Number(70.0), Action::Sell),
    Condition::new(Indicator::PriceAboveEma, Comparison::Eq, Threshold::Flag(true), Action::Buy),
    Condition::new(Indicator::PriceBelowEma, Comparison::Eq, Threshold::Flag(true), Action::Sell),
    Condition::new(Indicator::VolumeRatio, Comparison::Gt, Threshold::Number(1.5), Action::Buy),
    Condition::new(Indicator::TrendAlignment, Comparison::Eq, Threshold::Flag(true), Action::Buy),
];

/// Ordered rule list, first match wins
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionTree(pub Vec<Condition>);

impl DecisionTree {
    /// A random subset of the catalog, between 2 and len-1 rules, no repeats
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let count = rng.gen_range(2..CONDITION_CATALOG.len());
        Self(
            CONDITION_CATALOG
                .choose_multiple(rng, count)
                .copied()
                .collect(),
        )
    }

    pub fn evaluate(&self, snapshot: &MarketSnapshot) -> Action {
        self.0
            .iter()
            .find(|condition| condition.holds(snapshot))
            .map(|condition| condition.action)
            .unwrap_or(Action::Hold)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.0
    }
}

pub fn random_condition<R: Rng + ?Sized>(rng: &mut R) -> Condition {
    CONDITION_CATALOG[rng.gen_range(0..CONDITION_CATALOG.len())]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub trade_percentage: f64,
    pub risk_appetite: f64,
    pub max_trade_duration_minutes: u32,
    pub decision_tree: DecisionTree,
}

impl Gene {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            trade_percentage: rng.gen_range(TRADE_PERCENTAGE_RANGE),
            risk_appetite: rng.gen_range(RISK_APPETITE_RANGE),
            max_trade_duration_minutes: rng.gen_range(MAX_TRADE_DURATION_RANGE),
            decision_tree: DecisionTree::random(rng),
        }
    }

    pub fn decide(&self, snapshot: &MarketSnapshot) -> Action {
        self.decision_tree.evaluate(snapshot)
    }
}
