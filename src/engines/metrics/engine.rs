// src/engines/metrics/engine.rs
use crate::engines::metrics::{ProfitabilityMetrics, RiskMetrics};
use crate::error::{EvolutionError, Result};
use crate::types::Trade;
use serde::Serialize;
use std::collections::BTreeMap;

pub const WEIGHT_KEYS: [&str; 6] = [
    "profit",
    "sharpe_ratio",
    "max_drawdown",
    "profit_factor",
    "win_rate",
    "consistency",
];

/// Weights of the composite fitness, one per component
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitnessWeights {
    pub profit: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub win_rate: f64,
    pub consistency: f64,
}

impl FitnessWeights {
    /// Every key in [`WEIGHT_KEYS`] must be present and finite
    pub fn from_map(weights: &BTreeMap<String, f64>) -> Result<Self> {
        let missing: Vec<&str> = WEIGHT_KEYS
            .iter()
            .copied()
            .filter(|key| !weights.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(EvolutionError::Configuration(format!(
                "missing fitness weight(s): {}",
                missing.join(", ")
            )));
        }

        let get = |key: &str| -> Result<f64> {
            let value = weights[key];
            if value.is_finite() {
                Ok(value)
            } else {
                Err(EvolutionError::Configuration(format!(
                    "fitness weight {} must be finite, got {}",
                    key, value
                )))
            }
        };

        Ok(Self {
            profit: get("profit")?,
            sharpe_ratio: get("sharpe_ratio")?,
            max_drawdown: get("max_drawdown")?,
            profit_factor: get("profit_factor")?,
            win_rate: get("win_rate")?,
            consistency: get("consistency")?,
        })
    }
}

/// What the evaluator needs to know about one robot
#[derive(Debug, Clone, Copy)]
pub struct TradingHistory<'a> {
    pub robot_id: u64,
    pub profit: f64,
    pub initial_balance: f64,
    pub returns: &'a [f64],
    pub balance_history: &'a [f64],
    pub trades: &'a [Trade],
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FitnessReport {
    pub profit: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub win_rate: f64,
    pub consistency: f64,
    pub fitness: f64,
}

pub struct FitnessEvaluator {
    weights: FitnessWeights,
    annualization_factor: f64,
}

impl FitnessEvaluator {
    pub fn new(weights: FitnessWeights, annualization_factor: f64) -> Self {
        Self {
            weights,
            annualization_factor,
        }
    }

    /// Builds from the raw configured map, failing on any missing key
    pub fn from_config(weights: &BTreeMap<String, f64>, annualization_factor: f64) -> Result<Self> {
        Ok(Self::new(FitnessWeights::from_map(weights)?, annualization_factor))
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    pub fn evaluate(&self, history: &TradingHistory<'_>) -> Result<FitnessReport> {
        if !(history.initial_balance.is_finite() && history.initial_balance > 0.0) {
            return Err(EvolutionError::Evaluation {
                robot_id: history.robot_id,
                reason: format!("initial balance {} is not positive", history.initial_balance),
            });
        }

        let profit_component = history.profit / history.initial_balance;
        let sharpe_ratio = RiskMetrics::sharpe_ratio(history.returns, self.annualization_factor);
        let max_drawdown = RiskMetrics::max_drawdown(history.balance_history);
        let profit_factor = ProfitabilityMetrics::profit_factor(history.trades);
        let win_rate = ProfitabilityMetrics::win_rate(history.trades);
        let consistency = RiskMetrics::consistency(history.returns);

        let w = &self.weights;
        let fitness = w.profit * profit_component
            + w.sharpe_ratio * sharpe_ratio
            + w.max_drawdown * (1.0 - max_drawdown)
            + w.profit_factor * profit_factor
            + w.win_rate * win_rate
            + w.consistency * consistency;

        if !fitness.is_finite() {
            return Err(EvolutionError::Evaluation {
                robot_id: history.robot_id,
                reason: format!("composite fitness is not finite ({})", fitness),
            });
        }

        Ok(FitnessReport {
            profit: history.profit,
            sharpe_ratio,
            max_drawdown,
            profit_factor,
            win_rate,
            consistency,
            fitness,
        })
    }
}
