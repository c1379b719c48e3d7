// Standard library
use std::path::PathBuf;

// 3rd party crates
use serde::Deserialize;

// Project imports
use crate::utility::ip_detector::types::{IpDetection, IpService};

#[derive(Debug, Deserialize, Clone)]
pub struct Log {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Cache {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub ttl: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub detection: IpDetection,
    #[serde(default)]
    pub cache: Cache,

    /// Replaces the built-in catalog when non-empty
    #[serde(default)]
    pub services: Vec<IpService>,
}

pub(super) fn default_log_level() -> String {
    "warn".to_string()
}

pub(super) fn default_cache_enabled() -> bool {
    true
}

pub(super) fn default_cache_ttl() -> u64 {
    crate::utility::cache::DEFAULT_CACHE_TTL_SECS
}

/// Settings that passed `Settings::validate`.
#[derive(Debug, Clone)]
pub struct ValidatedSettings(pub(super) Settings);

/// Loads the application settings from defaults, file and environment.
#[derive(Debug)]
pub struct ConfigManager {
    pub settings: ValidatedSettings,
    pub config_path: PathBuf,
}
