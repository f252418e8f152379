//! Database command handler

use super::super::CliContext;
use crate::engine::{DatabaseFlags, FlagValidator, OperationOutcome, ResourceRequest};
use crate::errors::AppResult;
use crate::store::StoreConnector;

/// Handler for database operations
pub struct DatabaseHandler<'a> {
    context: &'a CliContext,
    connector: &'a dyn StoreConnector,
}

impl<'a> DatabaseHandler<'a> {
    pub fn new(context: &'a CliContext, connector: &'a dyn StoreConnector) -> Self {
        Self { context, connector }
    }

    /// Create or delete one database
    pub async fn handle_database(&self, flags: DatabaseFlags) -> AppResult<OperationOutcome> {
        let request = flags.validate()?;
        super::execute(self.context, self.connector, ResourceRequest::Database(request)).await
    }
}
