use super::{
    evolution::EvolutionConfig, fitness::FitnessConfig, paper::PaperMarketConfig,
    trading::TradingConfig, traits::ConfigSection,
};
use crate::error::EvolutionError;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `TRADEVOLVE__EVOLUTION__SEED=42`
pub const ENV_PREFIX: &str = "TRADEVOLVE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub trading: TradingConfig,
    pub fitness: FitnessConfig,
    pub paper: PaperMarketConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), EvolutionError> {
        self.evolution.validate()?;
        self.trading.validate()?;
        self.fitness.validate()?;
        self.paper.validate()?;
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Loads a TOML file layered with `TRADEVOLVE__*` environment overrides
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvolutionError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        self.install(settings.try_deserialize()?)
    }

    pub fn load_from_str(&self, contents: &str) -> Result<(), EvolutionError> {
        let settings = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;

        self.install(settings.try_deserialize()?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvolutionError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| EvolutionError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        match self.config.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Applies `f` to a copy and only keeps it when the result validates
    pub fn update<F>(&self, f: F) -> Result<(), EvolutionError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.get();
        f(&mut candidate);
        self.install(candidate)
    }

    fn install(&self, config: AppConfig) -> Result<(), EvolutionError> {
        config.validate()?;
        match self.config.write() {
            Ok(mut current) => *current = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
        Ok(())
    }
}
