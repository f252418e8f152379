//! Command handlers for all CLI operations
//!
//! Each resource command has its own handler that validates its flags into a
//! request. Execution is shared: open a store session, dispatch, close.

pub mod container;
pub mod database;
pub mod item;

use std::sync::Arc;
use tracing::debug;

use super::{CliContext, Commands};
use crate::engine::{ActionDispatcher, OperationOutcome, ResourceRequest};
use crate::errors::AppResult;
use crate::store::{DefaultStoreConnector, StoreConnector, StoreSession};

pub use container::ContainerHandler;
pub use database::DatabaseHandler;
pub use item::ItemHandler;

/// Routes commands to their handlers
pub struct CommandHandler {
    context: CliContext,
    connector: Arc<dyn StoreConnector>,
}

impl CommandHandler {
    /// Create a command handler that connects to the configured account
    pub fn new(context: CliContext) -> Self {
        Self::with_connector(context, Arc::new(DefaultStoreConnector::new()))
    }

    /// Create a command handler that obtains its store from `connector`
    pub fn with_connector(context: CliContext, connector: Arc<dyn StoreConnector>) -> Self {
        Self { context, connector }
    }

    /// Route a command to its handler
    pub async fn handle_command(&self, command: Commands) -> AppResult<OperationOutcome> {
        let connector = self.connector.as_ref();
        match command {
            Commands::Database(flags) => {
                DatabaseHandler::new(&self.context, connector)
                    .handle_database(flags)
                    .await
            }
            Commands::Container(flags) => {
                ContainerHandler::new(&self.context, connector)
                    .handle_container(flags)
                    .await
            }
            Commands::Item(flags) => {
                ItemHandler::new(&self.context, connector)
                    .handle_item(flags)
                    .await
            }
        }
    }
}

/// Run a validated request inside a store session.
///
/// The session is closed whether or not dispatch succeeds.
pub(crate) async fn execute(
    context: &CliContext,
    connector: &dyn StoreConnector,
    request: ResourceRequest,
) -> AppResult<OperationOutcome> {
    let session = StoreSession::open(connector, &context.config_manager)?;
    let result = ActionDispatcher::new(session.store()).dispatch(&request).await;
    session.close().await;

    if let Ok(outcome) = &result {
        debug!(
            kind = %request.kind(),
            success = outcome.success,
            status = %outcome.status,
            charge = outcome.request_charge,
            "Request finished"
        );
    }
    result
}
