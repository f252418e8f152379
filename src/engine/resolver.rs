//! Resource resolution
//!
//! Obtains the database or container handle an action runs against. With
//! `init` set the parents are created if missing; without it the handle is
//! a plain reference and existence is only checked by the action itself.

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::StoreResult;
use crate::store::{ContainerProperties, ContainerRef, DatabaseRef, DocumentStore, StoreResponse};

/// Result of resolving a handle
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Ready(T),
    /// Creating a parent was answered with a non-success status
    Failed(StoreResponse),
}

pub struct ResourceResolver<'s> {
    store: &'s dyn DocumentStore,
}

impl<'s> ResourceResolver<'s> {
    pub fn new(store: &'s dyn DocumentStore) -> Self {
        Self { store }
    }

    pub async fn database(&self, id: &str, init: bool) -> StoreResult<Resolution<DatabaseRef>> {
        if init {
            let response = self.store.create_database_if_not_exists(id).await?;
            if !response.status.is_success() {
                warn!(database = id, status = %response.status, "Database initialization failed");
                return Ok(Resolution::Failed(response));
            }
            debug!(database = id, status = %response.status, "Database ready");
        }
        Ok(Resolution::Ready(DatabaseRef::new(id)))
    }

    /// Resolve a container. With `init` the handle carries the partition path
    /// the store reported for the container, which may differ from the
    /// requested one when the container already existed.
    pub async fn container(
        &self,
        database_id: &str,
        properties: &ContainerProperties,
        init: bool,
    ) -> StoreResult<Resolution<ContainerRef>> {
        let database = match self.database(database_id, init).await? {
            Resolution::Ready(database) => database,
            Resolution::Failed(response) => return Ok(Resolution::Failed(response)),
        };

        if !init {
            return Ok(Resolution::Ready(database.container(properties.id.as_str())));
        }

        let response = self
            .store
            .create_container_if_not_exists(&database, properties)
            .await?;
        if !response.status.is_success() {
            warn!(
                database = database_id,
                container = %properties.id,
                status = %response.status,
                "Container initialization failed"
            );
            return Ok(Resolution::Failed(response));
        }

        let container = database.container(properties.id.as_str());
        match reported_partition_path(&response) {
            Some(path) => {
                debug!(
                    database = database_id,
                    container = %properties.id,
                    partition_path = path,
                    "Container ready"
                );
                Ok(Resolution::Ready(container.with_partition_path(path)))
            }
            // Left unset so item writes read the definition themselves
            None => {
                debug!(database = database_id, container = %properties.id, "Container ready");
                Ok(Resolution::Ready(container))
            }
        }
    }
}

/// First partition key path of a container definition in a response body
fn reported_partition_path(response: &StoreResponse) -> Option<&str> {
    response
        .body
        .as_ref()
        .and_then(|body| body.pointer("/partitionKey/paths/0"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::{MockStore, StoreCall};
    use crate::store::StatusCode;

    fn properties() -> ContainerProperties {
        ContainerProperties {
            id: "C".to_string(),
            partition_path: "/pk".to_string(),
            throughput: 400,
        }
    }

    #[tokio::test]
    async fn test_attach_without_init_makes_no_calls() {
        let store = MockStore::new();
        let resolver = ResourceResolver::new(&store);

        let container = resolver.container("D", &properties(), false).await.unwrap();
        assert_eq!(
            container,
            Resolution::Ready(DatabaseRef::new("D").container("C"))
        );
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_init_creates_parents_in_order() {
        let store = MockStore::new();
        let resolver = ResourceResolver::new(&store);

        let container = match resolver.container("D", &properties(), true).await.unwrap() {
            Resolution::Ready(container) => container,
            other => panic!("expected a container, got {:?}", other),
        };
        assert_eq!(container.partition_path(), Some("/pk"));
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::CreateDatabase("D".to_string()),
                StoreCall::CreateContainer {
                    database: "D".to_string(),
                    id: "C".to_string(),
                    partition_path: "/pk".to_string(),
                    throughput: 400,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_init_on_existing_parents_succeeds() {
        let store = MockStore::new().with_container("D", "C", "/pk");
        let resolver = ResourceResolver::new(&store);

        let resolution = resolver.container("D", &properties(), true).await.unwrap();
        assert!(matches!(resolution, Resolution::Ready(_)));
        assert!(store.has_container("D", "C"));
    }

    #[tokio::test]
    async fn test_init_keeps_existing_partition_path() {
        let store = MockStore::new().with_container("D", "C", "/category");
        let resolver = ResourceResolver::new(&store);

        let container = match resolver.container("D", &properties(), true).await.unwrap() {
            Resolution::Ready(container) => container,
            other => panic!("expected a container, got {:?}", other),
        };
        assert_eq!(container.partition_path(), Some("/category"));
    }

    #[test]
    fn test_partition_path_missing_from_body() {
        let mut response = StoreResponse::new(StatusCode::OK, 1.0);
        assert_eq!(reported_partition_path(&response), None);

        response.body = Some(serde_json::json!({ "id": "C" }));
        assert_eq!(reported_partition_path(&response), None);

        response.body = Some(serde_json::json!({
            "id": "C",
            "partitionKey": { "paths": ["/tenant"], "kind": "Hash" }
        }));
        assert_eq!(reported_partition_path(&response), Some("/tenant"));
    }

    #[tokio::test]
    async fn test_failed_parent_stops_resolution() {
        let store = MockStore::new().rejecting_databases(StatusCode::FORBIDDEN);
        let resolver = ResourceResolver::new(&store);

        let resolution = resolver.container("D", &properties(), true).await.unwrap();
        assert_eq!(
            resolution,
            Resolution::Failed(StoreResponse::new(StatusCode::FORBIDDEN, 1.0))
        );
        assert_eq!(store.calls(), vec![StoreCall::CreateDatabase("D".to_string())]);
    }
}
