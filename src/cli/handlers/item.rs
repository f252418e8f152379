//! Item command handler
//!
//! Items support a write (create or delete), a read (list or query), or a
//! write followed by a read. The container is resolved before either runs.

use tracing::debug;

use super::super::CliContext;
use crate::engine::{FlagValidator, ItemFlags, OperationOutcome, ResourceRequest};
use crate::errors::AppResult;
use crate::store::StoreConnector;

/// Handler for item operations
pub struct ItemHandler<'a> {
    context: &'a CliContext,
    connector: &'a dyn StoreConnector,
}

impl<'a> ItemHandler<'a> {
    pub fn new(context: &'a CliContext, connector: &'a dyn StoreConnector) -> Self {
        Self { context, connector }
    }

    pub async fn handle_item(&self, flags: ItemFlags) -> AppResult<OperationOutcome> {
        let request = flags.validate()?;
        if request.init_parents {
            debug!(
                database = %request.database_id,
                container = %request.container_id,
                "Database and container will be created if missing"
            );
        }
        super::execute(self.context, self.connector, ResourceRequest::Item(request)).await
    }
}
