// Standard library
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

// 3rd party crates
use config::{Config, ConfigError, Environment, File, FileFormat};
use tracing::{debug, error};

// Project imports
use crate::utility::ip_detector::types::ServiceCatalog;

// Current module imports
use super::constants::{CONFIG_PATH_ENV, DEFAULT_CONFIG, ENV_PREFIX, ENV_SEPARATOR};
use super::errors::{SettingsError, ValidationError};
use super::types::{
    default_cache_enabled, default_cache_ttl, default_log_level, Cache, ConfigManager, Log,
    Settings, ValidatedSettings,
};

impl Default for Log {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl: default_cache_ttl(),
        }
    }
}

impl Settings {
    pub fn get_log_level(&self) -> String {
        self.log.level.to_lowercase()
    }

    /// The configured services, or the built-in catalog if none are set.
    pub fn get_catalog(&self) -> ServiceCatalog {
        if self.services.is_empty() {
            ServiceCatalog::default()
        } else {
            ServiceCatalog::new(self.services.clone())
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        // Validate log level
        match self.get_log_level().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => return Err(ValidationError::InvalidLogLevel(self.log.level.clone())),
        }

        if self.cache.ttl == 0 {
            return Err(ValidationError::InvalidCacheTtl(self.cache.ttl));
        }

        self.detection.validate()?;
        ServiceCatalog::new(self.services.clone()).validate()?;

        Ok(())
    }
}

impl ConfigManager {
    /// Creates a new `ConfigManager` instance by loading and validating the configuration.
    pub fn new() -> Result<Self, SettingsError> {
        let config_path: PathBuf = Self::get_config_path()?;
        Self::from_path(&config_path, None)
    }

    /// Loads settings from `config_path`, with `env` standing in for the
    /// process environment when given.
    pub fn from_path(
        config_path: &Path,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, SettingsError> {
        let settings: Settings = Self::load_settings(config_path, env)?;

        // Validate settings before proceeding
        let validated_settings = ValidatedSettings::new(settings).map_err(|e| {
            error!("Configuration validation failed: {}", e);
            e
        })?;

        debug!("Configuration loaded, file: {:?}", config_path);

        Ok(ConfigManager {
            settings: validated_settings,
            config_path: config_path.to_path_buf(),
        })
    }

    /// Determines the configuration file path.
    fn get_config_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            Ok(PathBuf::from(path))
        } else if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("pubip").join("config.toml"))
        } else {
            let msg: &str = "Could not determine the configuration directory";
            error!("{}", msg);
            Err(ConfigError::Message(msg.into()))
        }
    }

    /// Layers the built-in defaults, the optional file and environment variables.
    fn load_settings(
        config_path: &Path,
        env: Option<HashMap<String, String>>,
    ) -> Result<Settings, ConfigError> {
        let config_file: &str = config_path.to_str().ok_or_else(|| {
            let msg: &str = "Configuration file path contains invalid UTF-8 characters";
            error!("{}", msg);
            ConfigError::Message(msg.into())
        })?;

        let settings: Config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(
                File::with_name(config_file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_settings(&self) -> &Settings {
        &self.settings
    }

    pub fn get_log_level(&self) -> String {
        self.settings.get_log_level()
    }
}

impl ValidatedSettings {
    pub fn new(settings: Settings) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(ValidatedSettings(settings))
    }

    pub fn into_inner(self) -> Settings {
        self.0
    }
}

// Implement Deref to allow transparent access to Settings fields
impl std::ops::Deref for ValidatedSettings {
    type Target = Settings;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
