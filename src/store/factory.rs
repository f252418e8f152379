use std::sync::Arc;
use tracing::{debug, warn};

use super::cosmos::{CosmosClient, CosmosClientConfig};
use super::traits::DocumentStore;
use crate::config::ConfigManager;
use crate::errors::AppResult;

/// Opens store connections for command handlers
///
/// Handlers never build a client themselves, so tests can hand them a
/// pre-built store instead of a network client.
pub trait StoreConnector: Send + Sync {
    fn connect(&self, config: &ConfigManager) -> AppResult<Arc<dyn DocumentStore>>;
}

/// Connects to the account named in the configuration over REST
#[derive(Debug, Default)]
pub struct DefaultStoreConnector;

impl DefaultStoreConnector {
    pub fn new() -> Self {
        Self
    }
}

impl StoreConnector for DefaultStoreConnector {
    fn connect(&self, config: &ConfigManager) -> AppResult<Arc<dyn DocumentStore>> {
        let endpoint = config.endpoint()?;
        let client_config =
            CosmosClientConfig::from_store_config(endpoint, &config.config().store);
        debug!("connecting to {}", endpoint);
        Ok(Arc::new(CosmosClient::new(client_config)?))
    }
}

/// Hands out one already-built store on every connect
pub struct SharedStoreConnector {
    store: Arc<dyn DocumentStore>,
}

impl SharedStoreConnector {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl StoreConnector for SharedStoreConnector {
    fn connect(&self, _config: &ConfigManager) -> AppResult<Arc<dyn DocumentStore>> {
        Ok(Arc::clone(&self.store))
    }
}

/// A store connection scoped to one invocation
///
/// Call [`close`](Self::close) on every exit path; a session dropped
/// without being closed is logged.
pub struct StoreSession {
    store: Arc<dyn DocumentStore>,
    closed: bool,
}

impl StoreSession {
    pub fn open(connector: &dyn StoreConnector, config: &ConfigManager) -> AppResult<Self> {
        Ok(Self {
            store: connector.connect(config)?,
            closed: false,
        })
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub async fn close(mut self) {
        self.store.close().await;
        self.closed = true;
    }
}

impl Drop for StoreSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("store session dropped without being closed");
        }
    }
}
