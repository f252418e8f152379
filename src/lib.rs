//! Cosmos Console Library
//!
//! Command-line access to a Cosmos DB account: databases, containers and
//! items. The command core (validation, resolution, dispatch, aggregation)
//! lives in [`engine`] and talks to the account only through
//! [`store::DocumentStore`].

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod store;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigManager};
pub use engine::{ActionDispatcher, OperationOutcome, ResourceRequest};
pub use errors::{AppError, AppResult};
