use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

pub use reqwest::StatusCode;

use crate::errors::StoreResult;

/// One stored item: an open, string-keyed map of untyped values
pub type Document = Map<String, Value>;

/// Lazy, forward-only sequence of result pages
pub type FeedStream<'a> = BoxStream<'a, StoreResult<FeedPage>>;

/// Reference to a database by id. Obtaining one never contacts the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRef {
    id: String,
}

impl DatabaseRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Reference a container inside this database
    pub fn container(&self, id: impl Into<String>) -> ContainerRef {
        ContainerRef {
            database_id: self.id.clone(),
            id: id.into(),
            partition_path: None,
        }
    }
}

/// Reference to a container by database and container id.
///
/// `partition_path` is known when the container was just created through
/// this handle; otherwise the store client discovers it when it needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    database_id: String,
    id: String,
    partition_path: Option<String>,
}

impl ContainerRef {
    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn partition_path(&self) -> Option<&str> {
        self.partition_path.as_deref()
    }

    pub fn with_partition_path(mut self, path: impl Into<String>) -> Self {
        self.partition_path = Some(path.into());
        self
    }
}

/// Settings applied when a container is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerProperties {
    pub id: String,
    pub partition_path: String,
    pub throughput: u32,
}

/// A single remote response: any HTTP status the store answered with
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse {
    pub status: StatusCode,
    pub request_charge: f64,
    pub body: Option<Value>,
}

impl StoreResponse {
    pub fn new(status: StatusCode, request_charge: f64) -> Self {
        Self {
            status,
            request_charge,
            body: None,
        }
    }
}

/// One batch of a paginated read
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub status: StatusCode,
    pub request_charge: f64,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}

/// Query text plus named parameters, in the store's wire shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySpec {
    pub query: String,
    pub parameters: Vec<QueryParameter>,
}

impl QuerySpec {
    /// A query passed through verbatim, without parameters
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.push(QueryParameter {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// The remote document store, as seen by the command core.
///
/// Every method answers with the store's status code; only transport
/// failures are returned as `Err`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a database, succeeding with OK when it already exists
    async fn create_database_if_not_exists(&self, id: &str) -> StoreResult<StoreResponse>;

    async fn delete_database(&self, database: &DatabaseRef) -> StoreResult<StoreResponse>;

    /// Create a container, succeeding with OK when it already exists
    async fn create_container_if_not_exists(
        &self,
        database: &DatabaseRef,
        properties: &ContainerProperties,
    ) -> StoreResult<StoreResponse>;

    async fn delete_container(&self, container: &ContainerRef) -> StoreResult<StoreResponse>;

    /// Create an item. Without `partition_key` the value is taken from the
    /// item at the container's partition path.
    async fn create_item(
        &self,
        container: &ContainerRef,
        item: &Document,
        partition_key: Option<&str>,
    ) -> StoreResult<StoreResponse>;

    async fn delete_item(
        &self,
        container: &ContainerRef,
        id: &str,
        partition_key: &str,
    ) -> StoreResult<StoreResponse>;

    /// Run a query; pages are fetched one at a time as the stream is polled
    fn query_items<'a>(&'a self, container: &'a ContainerRef, query: QuerySpec) -> FeedStream<'a>;

    /// Release the connection. Called once at the end of every invocation.
    async fn close(&self) {}
}

/// Retry policy for throttled or temporarily unavailable responses
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_attempts: u32,
    /// Base delay between retries in milliseconds
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Backoff multiplier (exponential backoff)
    pub backoff_multiplier: f64,
    /// Jitter factor to add randomness to retry delays
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Calculate delay for a given attempt number
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay = self.base_delay_ms as f64;
        let delay = base_delay * self.backoff_multiplier.powi(attempt as i32);
        let delay = delay.min(self.max_delay_ms as f64);

        let jitter = delay * self.jitter_factor * (rand::random::<f64>() - 0.5);
        let final_delay = (delay + jitter).max(0.0) as u64;

        Duration::from_millis(final_delay)
    }

    /// Create a retry config with exponential backoff
    pub fn exponential(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            backoff_multiplier: 2.0,
            ..Default::default()
        }
    }

    /// Disable retries entirely
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }

    /// Whether the store asked the caller to back off and try again
    pub fn is_retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_ref_from_database() {
        let db = DatabaseRef::new("D");
        let container = db.container("C");
        assert_eq!(container.database_id(), "D");
        assert_eq!(container.id(), "C");
        assert_eq!(container.partition_path(), None);

        let container = container.with_partition_path("/pk");
        assert_eq!(container.partition_path(), Some("/pk"));
    }

    #[test]
    fn test_query_spec_serializes_in_wire_shape() {
        let spec = QuerySpec::text("SELECT * FROM c WHERE c._ts >= @start")
            .with_parameter("@start", 0);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["query"], "SELECT * FROM c WHERE c._ts >= @start");
        assert_eq!(json["parameters"][0]["name"], "@start");
        assert_eq!(json["parameters"][0]["value"], 0);
    }

    #[test]
    fn test_retry_config() {
        let config = RetryConfig::exponential(3, 100);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 100);

        let delay1 = config.calculate_delay(0);
        let delay2 = config.calculate_delay(2);
        assert!(delay2 > delay1);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(RetryConfig::is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(RetryConfig::is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!RetryConfig::is_retryable(StatusCode::NOT_FOUND));
        assert!(!RetryConfig::is_retryable(StatusCode::CONFLICT));
    }
}
