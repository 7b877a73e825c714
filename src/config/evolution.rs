use super::traits::{invalid, ConfigSection};
use crate::error::EvolutionError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub elite_size: usize,
    pub max_generations: usize,
    /// How many of the selected parents are eligible for pairing
    pub parent_pool_size: usize,
    pub seed: Option<u64>,
    pub termination: TerminationPolicy,
    pub history_dir: Option<PathBuf>,
}

/// When the evolution loop stops. The generation cap applies to every policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum TerminationPolicy {
    #[default]
    GenerationCap,
    /// Stop once the latest best robot earned `ratio * initial_balance`
    ProfitTarget { ratio: f64 },
    /// Stop once the latest best fitness exceeds `threshold`
    FitnessTarget { threshold: f64 },
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            elite_size: 5,
            max_generations: 20,
            parent_pool_size: 10,
            seed: None,
            termination: TerminationPolicy::default(),
            history_dir: None,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), EvolutionError> {
        if self.population_size == 0 {
            return Err(invalid::<Self>("Population size must be greater than 0"));
        }
        if self.parent_pool_size == 0 {
            return Err(invalid::<Self>("Parent pool size must be greater than 0"));
        }
        match self.termination {
            TerminationPolicy::ProfitTarget { ratio } if !ratio.is_finite() => {
                Err(invalid::<Self>("Profit target ratio must be finite"))
            }
            TerminationPolicy::FitnessTarget { threshold } if !threshold.is_finite() => {
                Err(invalid::<Self>("Fitness target threshold must be finite"))
            }
            _ => Ok(()),
        }
    }
}
