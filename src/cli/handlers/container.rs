//! Container command handler

use tracing::debug;

use super::super::CliContext;
use crate::engine::{ContainerFlags, FlagValidator, OperationOutcome, ResourceRequest};
use crate::errors::AppResult;
use crate::store::StoreConnector;

/// Handler for container operations
pub struct ContainerHandler<'a> {
    context: &'a CliContext,
    connector: &'a dyn StoreConnector,
}

impl<'a> ContainerHandler<'a> {
    pub fn new(context: &'a CliContext, connector: &'a dyn StoreConnector) -> Self {
        Self { context, connector }
    }

    /// Create or delete one container, optionally creating its database first
    pub async fn handle_container(&self, flags: ContainerFlags) -> AppResult<OperationOutcome> {
        let request = flags.validate()?;
        if request.init_database {
            debug!(database = %request.database_id, "Database will be created if missing");
        }
        super::execute(self.context, self.connector, ResourceRequest::Container(request)).await
    }
}
