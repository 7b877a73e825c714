//! Evolutionary search over rule-based trading robots.
//!
//! A population of [`Robot`]s trades against a [`MarketClient`], is scored by
//! the [`FitnessEvaluator`] and bred into the next generation by the
//! [`EvolutionEngine`].

pub mod config;
pub mod engines;
pub mod error;
pub mod logging;
pub mod market;
pub mod types;
pub mod utils;

pub use config::{AppConfig, ConfigManager};
pub use engines::evaluation::{GeneStrategy, Robot, Strategy};
pub use engines::generation::{EvolutionEngine, FinalResults, GenerationRecord};
pub use engines::metrics::FitnessEvaluator;
pub use error::{EvolutionError, Result};
pub use logging::Logger;
pub use market::{MarketClient, PaperExchange};
