use super::traits::{invalid, ConfigSection};
use crate::engines::metrics::FitnessWeights;
use crate::error::EvolutionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Five-minute bars over a year
pub const DEFAULT_ANNUALIZATION_FACTOR: f64 = 365.0 * 24.0 * 12.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    /// Keyed by component name; every component must be present
    pub weights: BTreeMap<String, f64>,
    pub annualization_factor: f64,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        let weights = [
            ("profit", 1.0),
            ("sharpe_ratio", 0.5),
            ("max_drawdown", 0.5),
            ("profit_factor", 0.1),
            ("win_rate", 0.2),
            ("consistency", 0.1),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            weights,
            annualization_factor: DEFAULT_ANNUALIZATION_FACTOR,
        }
    }
}

impl FitnessConfig {
    pub fn fitness_weights(&self) -> Result<FitnessWeights, EvolutionError> {
        FitnessWeights::from_map(&self.weights)
    }
}

impl ConfigSection for FitnessConfig {
    fn section_name() -> &'static str {
        "fitness"
    }

    fn validate(&self) -> Result<(), EvolutionError> {
        self.fitness_weights()?;
        if !(self.annualization_factor.is_finite() && self.annualization_factor > 0.0) {
            return Err(invalid::<Self>("Annualization factor must be positive"));
        }
        Ok(())
    }
}
