use super::traits::{invalid, ConfigSection};
use crate::error::EvolutionError;
use serde::{Deserialize, Serialize};

/// Settings for the simulated venue used by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperMarketConfig {
    pub seed: u64,
    pub initial_price: f64,
    /// Standard deviation of the per-step log return
    pub volatility: f64,
    pub slippage_bps: f64,
    pub latency_ms: u64,
    /// Probability that an order is rejected outright
    pub rejection_rate: f64,
}

impl Default for PaperMarketConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            initial_price: 50_000.0,
            volatility: 0.004,
            slippage_bps: 2.0,
            latency_ms: 0,
            rejection_rate: 0.0,
        }
    }
}

impl ConfigSection for PaperMarketConfig {
    fn section_name() -> &'static str {
        "paper"
    }

    fn validate(&self) -> Result<(), EvolutionError> {
        if !(self.initial_price.is_finite() && self.initial_price > 0.0) {
            return Err(invalid::<Self>("Initial price must be positive"));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(invalid::<Self>("Volatility must be non-negative"));
        }
        if !(self.slippage_bps.is_finite() && self.slippage_bps >= 0.0) {
            return Err(invalid::<Self>("Slippage must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.rejection_rate) {
            return Err(invalid::<Self>("Rejection rate must be between 0 and 1"));
        }
        Ok(())
    }
}
