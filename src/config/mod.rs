pub mod traits;
pub mod evolution;
pub mod trading;
pub mod fitness;
pub mod paper;
pub mod manager;

pub use manager::{AppConfig, ConfigManager};
pub use evolution::{EvolutionConfig, TerminationPolicy};
pub use trading::TradingConfig;
pub use fitness::FitnessConfig;
pub use paper::PaperMarketConfig;
pub use traits::ConfigSection;
