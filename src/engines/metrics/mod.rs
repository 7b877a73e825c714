pub mod profitability;
pub mod risk;
pub mod engine;

pub use profitability::{ProfitabilityMetrics, PROFIT_FACTOR_CAP};
pub use risk::RiskMetrics;
pub use engine::{FitnessEvaluator, FitnessReport, FitnessWeights, TradingHistory, WEIGHT_KEYS};
