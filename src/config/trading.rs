use super::traits::{invalid, ConfigSection};
use crate::error::EvolutionError;
use crate::market::LotSizes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub symbol: String,
    pub initial_balance: f64,
    pub generation_duration_steps: usize,
    pub order_timeout_ms: u64,
    /// Pause between steps; zero for simulations
    pub step_interval_ms: u64,
    pub min_lot: BTreeMap<String, f64>,
    pub default_min_lot: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        let mut min_lot = BTreeMap::new();
        min_lot.insert("BTCUSDT".to_string(), 0.001);
        min_lot.insert("DOGEUSDT".to_string(), 100.0);

        Self {
            symbol: "BTCUSDT".to_string(),
            initial_balance: 1000.0,
            generation_duration_steps: 5,
            order_timeout_ms: 5000,
            step_interval_ms: 0,
            min_lot,
            default_min_lot: 1.0,
        }
    }
}

impl TradingConfig {
    pub fn order_timeout(&self) -> Duration {
        Duration::from_millis(self.order_timeout_ms)
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    pub fn lot_sizes(&self) -> LotSizes {
        LotSizes::new(self.min_lot.clone(), self.default_min_lot)
    }
}

impl ConfigSection for TradingConfig {
    fn section_name() -> &'static str {
        "trading"
    }

    fn validate(&self) -> Result<(), EvolutionError> {
        if self.symbol.trim().is_empty() {
            return Err(invalid::<Self>("Symbol must not be empty"));
        }
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(invalid::<Self>("Initial balance must be positive"));
        }
        if self.generation_duration_steps == 0 {
            return Err(invalid::<Self>("Generation duration must be at least one step"));
        }
        if self.order_timeout_ms == 0 {
            return Err(invalid::<Self>("Order timeout must be positive"));
        }
        if !(self.default_min_lot.is_finite() && self.default_min_lot > 0.0) {
            return Err(invalid::<Self>("Default minimum lot must be positive"));
        }
        if let Some((symbol, lot)) = self
            .min_lot
            .iter()
            .find(|(_, lot)| !(lot.is_finite() && **lot > 0.0))
        {
            return Err(invalid::<Self>(format!(
                "Minimum lot for {} must be positive, got {}",
                symbol, lot
            )));
        }
        Ok(())
    }
}
