//! Document store access
//!
//! The command core talks to the store only through [`DocumentStore`]:
//!
//! - **CosmosClient**: REST implementation used by the binary
//! - **MockStore**: in-memory implementation that records calls, for tests
//! - **StoreConnector**: how handlers obtain a store for one invocation

pub mod cosmos;
pub mod factory;
pub mod mock;
pub mod traits;

pub use cosmos::{CosmosClient, CosmosClientConfig};
pub use factory::{DefaultStoreConnector, SharedStoreConnector, StoreConnector, StoreSession};
pub use traits::{
    ContainerProperties, ContainerRef, DatabaseRef, Document, DocumentStore, FeedPage,
    FeedStream, QueryParameter, QuerySpec, RetryConfig, StatusCode, StoreResponse,
};
