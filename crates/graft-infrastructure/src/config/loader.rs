//! Configuration loader
//!
//! Handles loading configuration from various sources including
//! TOML files, environment variables, and default values.

use std::env;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use graft_domain::error::{Error, Result};

use crate::config::AppConfig;
use crate::constants::{
    CONFIG_ENV_PREFIX, CONFIG_ENV_SEPARATOR, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME,
};
use crate::error_ext::ErrorContext;
use crate::logging::{log_config_loaded, parse_log_level};

/// Configuration loader service
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    #[must_use]
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    #[must_use]
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Configuration sources are merged in this order (later sources override earlier):
    /// 1. Default values from `AppConfig::default()`
    /// 2. TOML configuration file (explicit path, or the first default location found)
    /// 3. Environment variables with prefix (e.g., `GRAFT__LOGGING__LEVEL`)
    ///
    /// An explicit path that does not exist is an error.
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(config_path) = &self.config_path {
            if !config_path.exists() {
                log_config_loaded(config_path, false);
                return Err(Error::config(format!(
                    "Configuration file not found: {}",
                    config_path.display()
                )));
            }
            figment = figment.merge(Toml::file(config_path));
            log_config_loaded(config_path, true);
        } else if let Some(default_path) = Self::find_default_config_path() {
            figment = figment.merge(Toml::file(&default_path));
            log_config_loaded(&default_path, true);
        }

        self.extract(figment)
    }

    /// Load configuration from TOML text instead of a file
    pub fn load_from_str(&self, toml: &str) -> Result<AppConfig> {
        let figment = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(toml));
        self.extract(figment)
    }

    /// Get the current configuration file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn extract(&self, figment: Figment) -> Result<AppConfig> {
        let prefix = format!("{}{CONFIG_ENV_SEPARATOR}", self.env_prefix);
        let app_config: AppConfig = figment
            .merge(Env::prefixed(&prefix).split(CONFIG_ENV_SEPARATOR))
            .extract()
            .config_context("Failed to extract configuration")?;

        validate_app_config(&app_config)?;
        Ok(app_config)
    }

    /// Find default configuration file paths to try
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;

        let candidates = [
            Some(current_dir.join(DEFAULT_CONFIG_FILENAME)),
            Some(
                current_dir
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME),
            ),
            dirs::config_dir().map(|d| d.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME)),
            dirs::home_dir().map(|d| {
                d.join(format!(".{DEFAULT_CONFIG_DIR}"))
                    .join(DEFAULT_CONFIG_FILENAME)
            }),
        ];

        candidates.into_iter().flatten().find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate application configuration
fn validate_app_config(config: &AppConfig) -> Result<()> {
    validate_logging_config(config)?;
    validate_container_config(config)?;
    Ok(())
}

fn validate_logging_config(config: &AppConfig) -> Result<()> {
    parse_log_level(&config.logging.level).map(|_| ())
}

fn validate_container_config(config: &AppConfig) -> Result<()> {
    if config.container.shutdown_timeout_secs == 0 {
        return Err(Error::config("Shutdown timeout cannot be 0"));
    }
    Ok(())
}
