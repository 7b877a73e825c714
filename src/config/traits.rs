use crate::error::EvolutionError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), EvolutionError>;
}

/// Prefixes a section-level message with the section name
pub(crate) fn invalid<S: ConfigSection>(message: impl AsRef<str>) -> EvolutionError {
    EvolutionError::Configuration(format!("[{}] {}", S::section_name(), message.as_ref()))
}
