use thiserror::Error;
use trajfind_scanner::ScanError;

/// Why a single strategy produced no record.
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Base object not found at path '{0}'")]
    PathNotFound(String),

    #[error("Search failed: {0}")]
    Scan(#[from] ScanError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    #[error("Invalid interval_ms: {0}. Must be at least 1")]
    InvalidInterval(u64),

    #[error("Marker key cannot be empty")]
    EmptyMarkerKey,

    #[error("At least one strategy is required")]
    NoStrategies,

    #[error("Invalid strategy '{0}'. Expected ROOT_PATH=PREFERRED_SUBSTRING")]
    InvalidStrategy(String),

    #[error("Invalid log level: {0}. Must be one of: debug, info, warn, error, none")]
    InvalidLogLevel(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}
