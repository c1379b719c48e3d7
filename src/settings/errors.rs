// 3rd party crates
use config::ConfigError;
use thiserror::Error;

// Project imports
use crate::utility::ip_detector::errors::IpDetectionValidationError;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid log level: {0}. Must be one of: error, warn, info, debug, trace")]
    InvalidLogLevel(String),
    #[error("Cache TTL must be greater than 0, got {0}")]
    InvalidCacheTtl(u64),
    #[error("IP detection configuration error: {0}")]
    IpDetectionConfig(#[from] IpDetectionValidationError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationError),
}
