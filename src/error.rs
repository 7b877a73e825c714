use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvolutionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Market error: {0}")]
    Market(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Evaluation error for robot {robot_id}: {reason}")]
    Evaluation { robot_id: u64, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, EvolutionError>;
