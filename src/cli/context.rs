//! CLI Context for dependency injection and shared state
//!
//! Centralizes configuration so handlers never load it themselves.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ConfigManager;

/// CLI execution context containing shared dependencies and configuration
#[derive(Debug, Clone)]
pub struct CliContext {
    pub verbose: bool,
    pub config_manager: Arc<ConfigManager>,
}

impl CliContext {
    /// Create a new CLI context, loading configuration from `config_path`
    /// or the default location
    pub fn new(config_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let config_manager = Arc::new(ConfigManager::load(config_path)?);
        Ok(Self::with_config(config_manager, verbose))
    }

    /// Create a context around an already-loaded configuration
    pub fn with_config(config_manager: Arc<ConfigManager>, verbose: bool) -> Self {
        Self {
            verbose,
            config_manager,
        }
    }

    /// Initialize logging subsystem based on verbosity and configuration.
    ///
    /// Logs are written to stderr; stdout carries only the command report.
    pub fn init_logging(&self) -> Result<()> {
        let log_level = if self.verbose {
            "debug"
        } else {
            self.config_manager.config().logging.level.as_str()
        };

        let installed = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env().add_directive(
                    log_level
                        .parse()
                        .unwrap_or_else(|_| tracing::Level::WARN.into()),
                ),
            )
            .try_init();

        if installed.is_err() {
            tracing::debug!("Logging already initialized");
        }

        if self.verbose {
            tracing::debug!("Verbose logging enabled");
            tracing::debug!("Config path: {:?}", self.config_manager.config_path());
        }

        Ok(())
    }
}
