use crate::errors::{AppError, AppResult, ErrorContextExt};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding `store.endpoint_uri`
pub const ENDPOINT_ENV: &str = "COSMOS_ENDPOINT_URI";
/// Environment variable overriding `store.auth_token`
pub const AUTH_TOKEN_ENV: &str = "COSMOS_AUTH_TOKEN";

/// Main configuration structure
///
/// Holds the store connectivity parameters and logging settings. Every field
/// has a default so a partial (or absent) configuration file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Connectivity settings for the document store account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub endpoint_uri: Option<String>,
    pub auth_token: Option<String>,
    pub application_name: String,
    pub api_version: String,
    pub timeout_secs: u64,
    pub max_retry_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint_uri: None,
            auth_token: None,
            application_name: "CosmosConsoleClient".to_string(),
            api_version: "2018-12-31".to_string(),
            timeout_secs: 30,
            max_retry_attempts: 3,
            retry_base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration manager
///
/// Loads the TOML configuration file and layers environment overrides on top.
///
/// # Configuration Sources
///
/// 1. **File**: `--config <path>`, or `~/.cosmos-console/config.toml` by default.
///    A missing file is not an error; defaults are used and nothing is written.
/// 2. **Environment**: `COSMOS_ENDPOINT_URI` and `COSMOS_AUTH_TOKEN` replace
///    the corresponding file values.
///
/// # Example
///
/// ```rust,no_run
/// use cosmos_console::config::ConfigManager;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = ConfigManager::load(None)?;
///     println!("Endpoint: {:?}", manager.config().store.endpoint_uri);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Load configuration from `config_path` (or the default location) and
    /// apply process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined, or the
    /// file exists but cannot be read or parsed.
    pub fn load(config_path: Option<PathBuf>) -> AppResult<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        let mut manager = Self::from_file(&config_path)?;
        manager.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(manager)
    }

    /// Load configuration from a file without consulting the environment
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let config = if path.exists() {
            let content =
                fs::read_to_string(path).in_file_operation(path, "read config file")?;
            toml::from_str(&content)
                .map_err(|e| AppError::config_with_source("Failed to parse config file", e))?
        } else {
            Config::default()
        };

        Ok(Self {
            config_path: path.to_path_buf(),
            config,
        })
    }

    /// Default configuration file location in the user's home directory
    pub fn default_config_path() -> AppResult<PathBuf> {
        let base_dirs =
            BaseDirs::new().ok_or_else(|| AppError::config("Failed to get base directories"))?;
        Ok(base_dirs
            .home_dir()
            .join(".cosmos-console")
            .join("config.toml"))
    }

    /// Replace connectivity settings with values supplied by `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            self.config.store.endpoint_uri = Some(endpoint);
        }
        if let Some(token) = lookup(AUTH_TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
            self.config.store.auth_token = Some(token);
        }
    }

    /// Path the configuration was (or would have been) read from
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The configured store endpoint
    ///
    /// Only needed once a command has passed validation, so a missing
    /// endpoint never masks a flag error.
    pub fn endpoint(&self) -> AppResult<&str> {
        self.config
            .store
            .endpoint_uri
            .as_deref()
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| {
                AppError::config(format!(
                    "No store endpoint configured; set {} or store.endpoint_uri in {}",
                    ENDPOINT_ENV,
                    self.config_path.display()
                ))
            })
    }
}
