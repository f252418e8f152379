//! Action dispatch
//!
//! Executes a validated request against the store: resolves the handle it
//! needs, runs the selected action and aggregates the responses. Calls are
//! strictly sequential. Nothing is retried here.

use tracing::{debug, info};

use super::outcome::{fold_pages, OperationOutcome, WriteKind};
use super::request::{
    ContainerRequest, DatabaseRequest, ItemRequest, ItemWrite, ReadAction, ResourceRequest,
    WriteAction,
};
use super::resolver::{Resolution, ResourceResolver};
use crate::errors::{AppResult, InternalError};
use crate::store::{ContainerProperties, ContainerRef, DatabaseRef, DocumentStore, QuerySpec};

/// Query selecting every item modified within `[@start, @stop]`
pub const LIST_QUERY: &str = "SELECT * FROM c WHERE c._ts >= @start AND c._ts <= @stop";

pub struct ActionDispatcher<'s> {
    store: &'s dyn DocumentStore,
}

impl<'s> ActionDispatcher<'s> {
    pub fn new(store: &'s dyn DocumentStore) -> Self {
        Self { store }
    }

    pub async fn dispatch(&self, request: &ResourceRequest) -> AppResult<OperationOutcome> {
        info!("Dispatching: {}", request.describe());
        match request {
            ResourceRequest::Database(r) => self.database(r).await,
            ResourceRequest::Container(r) => self.container(r).await,
            ResourceRequest::Item(r) => self.item(r).await,
        }
    }

    async fn database(&self, request: &DatabaseRequest) -> AppResult<OperationOutcome> {
        let outcome = match &request.action {
            WriteAction::Create(id) => {
                let response = self.store.create_database_if_not_exists(id).await?;
                OperationOutcome::from_response(WriteKind::Create, &response)
            }
            WriteAction::Delete(id) => {
                let response = self.store.delete_database(&DatabaseRef::new(id.as_str())).await?;
                OperationOutcome::from_response(WriteKind::Delete, &response)
            }
        };
        Ok(outcome)
    }

    async fn container(&self, request: &ContainerRequest) -> AppResult<OperationOutcome> {
        let resolver = ResourceResolver::new(self.store);
        let database = match resolver
            .database(&request.database_id, request.init_database)
            .await?
        {
            Resolution::Ready(database) => database,
            Resolution::Failed(response) => return Ok(OperationOutcome::aborted(&response)),
        };

        let outcome = match &request.action {
            WriteAction::Create(id) => {
                let properties = ContainerProperties {
                    id: id.clone(),
                    partition_path: request.partition_path.clone(),
                    throughput: request.throughput,
                };
                let response = self
                    .store
                    .create_container_if_not_exists(&database, &properties)
                    .await?;
                OperationOutcome::from_response(WriteKind::Create, &response)
            }
            WriteAction::Delete(id) => {
                let response = self
                    .store
                    .delete_container(&database.container(id.as_str()))
                    .await?;
                OperationOutcome::from_response(WriteKind::Delete, &response)
            }
        };
        Ok(outcome)
    }

    async fn item(&self, request: &ItemRequest) -> AppResult<OperationOutcome> {
        // Checked before resolving so that no parent is created for nothing
        if request.plan.write.is_none() && request.plan.read.is_none() {
            return Err(InternalError::NoActionSelected { resource: "item" }.into());
        }

        let properties = ContainerProperties {
            id: request.container_id.clone(),
            partition_path: request.partition_path.clone(),
            throughput: request.throughput,
        };
        let container = match ResourceResolver::new(self.store)
            .container(&request.database_id, &properties, request.init_parents)
            .await?
        {
            Resolution::Ready(container) => container,
            Resolution::Failed(response) => return Ok(OperationOutcome::aborted(&response)),
        };

        let written = match &request.plan.write {
            Some(write) => Some(self.write_item(&container, write, request).await?),
            None => None,
        };

        match &request.plan.read {
            Some(read) => {
                let seed = written.unwrap_or_else(OperationOutcome::seed);
                self.read_items(&container, read, seed).await
            }
            None => {
                written.ok_or_else(|| InternalError::NoActionSelected { resource: "item" }.into())
            }
        }
    }

    async fn write_item(
        &self,
        container: &ContainerRef,
        write: &ItemWrite,
        request: &ItemRequest,
    ) -> AppResult<OperationOutcome> {
        let outcome = match write {
            ItemWrite::Create(document) => {
                let response = self
                    .store
                    .create_item(container, document, request.partition_key.as_deref())
                    .await?;
                OperationOutcome::from_response(WriteKind::Create, &response)
            }
            ItemWrite::Delete(id) => {
                let partition_key = request.partition_key.as_deref().unwrap_or(id.as_str());
                debug!(item = %id, partition_key, "Deleting item");
                let response = self.store.delete_item(container, id, partition_key).await?;
                OperationOutcome::from_response(WriteKind::Delete, &response)
            }
        };
        Ok(outcome)
    }

    async fn read_items(
        &self,
        container: &ContainerRef,
        read: &ReadAction,
        seed: OperationOutcome,
    ) -> AppResult<OperationOutcome> {
        let query = match read {
            ReadAction::List { start, stop } => QuerySpec::text(LIST_QUERY)
                .with_parameter("@start", *start)
                .with_parameter("@stop", *stop),
            ReadAction::Query(text) => QuerySpec::text(text.as_str()),
        };
        debug!(query = %query.query, "Reading items");

        let pages = self.store.query_items(container, query);
        Ok(fold_pages(seed, pages).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::request::{ItemPlan, DEFAULT_PARTITION_PATH, DEFAULT_THROUGHPUT};
    use crate::errors::AppError;
    use crate::store::mock::{MockStore, StoreCall};
    use crate::store::{Document, FeedPage, StatusCode};
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    fn item_request(plan: ItemPlan) -> ResourceRequest {
        ResourceRequest::Item(ItemRequest {
            init_parents: false,
            database_id: "D".to_string(),
            container_id: "C".to_string(),
            partition_path: DEFAULT_PARTITION_PATH.to_string(),
            partition_key: None,
            throughput: DEFAULT_THROUGHPUT,
            plan,
        })
    }

    #[tokio::test]
    async fn test_database_create_is_idempotent() {
        let store = MockStore::new();
        let dispatcher = ActionDispatcher::new(&store);
        let request = ResourceRequest::Database(DatabaseRequest {
            action: WriteAction::Create("D".to_string()),
        });

        let first = dispatcher.dispatch(&request).await.unwrap();
        let second = dispatcher.dispatch(&request).await.unwrap();
        assert!(first.success);
        assert_eq!(first.status, StatusCode::CREATED);
        assert!(second.success);
        assert_eq!(second.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_missing_database_is_reported_not_raised() {
        let store = MockStore::new();
        let request = ResourceRequest::Database(DatabaseRequest {
            action: WriteAction::Delete("D".to_string()),
        });

        let outcome = ActionDispatcher::new(&store).dispatch(&request).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_container_create_with_init_db() {
        let store = MockStore::new();
        let request = ResourceRequest::Container(ContainerRequest {
            init_database: true,
            database_id: "D".to_string(),
            partition_path: "/category".to_string(),
            throughput: 1000,
            action: WriteAction::Create("X".to_string()),
        });

        let outcome = ActionDispatcher::new(&store).dispatch(&request).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.status, StatusCode::CREATED);
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::CreateDatabase("D".to_string()),
                StoreCall::CreateContainer {
                    database: "D".to_string(),
                    id: "X".to_string(),
                    partition_path: "/category".to_string(),
                    throughput: 1000,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_container_create_without_database_fails_at_action() {
        let store = MockStore::new();
        let request = ResourceRequest::Container(ContainerRequest {
            init_database: false,
            database_id: "D".to_string(),
            partition_path: DEFAULT_PARTITION_PATH.to_string(),
            throughput: DEFAULT_THROUGHPUT,
            action: WriteAction::Create("X".to_string()),
        });

        let outcome = ActionDispatcher::new(&store).dispatch(&request).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_item_delete_defaults_partition_key_to_id() {
        let store = MockStore::new().with_container("D", "C", "/id");
        let request = item_request(ItemPlan {
            write: Some(ItemWrite::Delete("abc".to_string())),
            read: None,
        });

        ActionDispatcher::new(&store).dispatch(&request).await.unwrap();
        assert_eq!(
            store.calls(),
            vec![StoreCall::DeleteItem {
                database: "D".to_string(),
                container: "C".to_string(),
                id: "abc".to_string(),
                partition_key: "abc".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_item_delete_uses_partition_key_override() {
        let store = MockStore::new().with_container("D", "C", "/category");
        let container = DatabaseRef::new("D").container("C");
        store
            .create_item(&container, &doc(json!({"id": "abc", "category": "tools"})), None)
            .await
            .unwrap();

        let mut request = match item_request(ItemPlan {
            write: Some(ItemWrite::Delete("abc".to_string())),
            read: None,
        }) {
            ResourceRequest::Item(r) => r,
            _ => unreachable!(),
        };
        request.partition_key = Some("tools".to_string());

        let outcome = ActionDispatcher::new(&store)
            .dispatch(&ResourceRequest::Item(request))
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_item_list_builds_bounded_query() {
        let store = MockStore::new().with_container("D", "C", "/id");
        let request = item_request(ItemPlan {
            write: None,
            read: Some(ReadAction::List { start: 0, stop: 100 }),
        });

        let outcome = ActionDispatcher::new(&store).dispatch(&request).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.items, Some(Vec::new()));
        assert_eq!(
            store.calls(),
            vec![StoreCall::Query {
                database: "D".to_string(),
                container: "C".to_string(),
                query: QuerySpec::text(LIST_QUERY)
                    .with_parameter("@start", 0)
                    .with_parameter("@stop", 100),
            }]
        );
    }

    #[tokio::test]
    async fn test_item_create_then_query_composes() {
        let store = MockStore::new().with_container("D", "C", "/id");
        let request = item_request(ItemPlan {
            write: Some(ItemWrite::Create(doc(json!({"id": "1", "name": "a"})))),
            read: Some(ReadAction::Query("SELECT * FROM c".to_string())),
        });

        let outcome = ActionDispatcher::new(&store).dispatch(&request).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.status, StatusCode::OK);
        assert_eq!(outcome.request_charge, 2.0);
        assert_eq!(
            outcome.items,
            Some(vec![doc(json!({"id": "1", "name": "a"}))])
        );
    }

    #[tokio::test]
    async fn test_item_paged_read_latches_failure() {
        let store = MockStore::new().with_pages(vec![
            FeedPage {
                status: StatusCode::OK,
                request_charge: 1.0,
                documents: vec![doc(json!({"id": "1"}))],
            },
            FeedPage {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                request_charge: 1.0,
                documents: vec![doc(json!({"id": "2"}))],
            },
            FeedPage {
                status: StatusCode::OK,
                request_charge: 1.0,
                documents: vec![doc(json!({"id": "3"}))],
            },
        ]);
        let request = item_request(ItemPlan {
            write: None,
            read: Some(ReadAction::Query("SELECT * FROM c".to_string())),
        });

        let outcome = ActionDispatcher::new(&store).dispatch(&request).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.status, StatusCode::OK);
        assert_eq!(outcome.request_charge, 3.0);
        assert_eq!(outcome.items.map(|items| items.len()), Some(3));
    }

    #[tokio::test]
    async fn test_item_parent_init_failure_short_circuits() {
        let store = MockStore::new().rejecting_databases(StatusCode::FORBIDDEN);
        let mut request = match item_request(ItemPlan {
            write: Some(ItemWrite::Delete("abc".to_string())),
            read: None,
        }) {
            ResourceRequest::Item(r) => r,
            _ => unreachable!(),
        };
        request.init_parents = true;

        let outcome = ActionDispatcher::new(&store)
            .dispatch(&ResourceRequest::Item(request))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.status, StatusCode::FORBIDDEN);
        assert_eq!(store.calls(), vec![StoreCall::CreateDatabase("D".to_string())]);
    }

    #[tokio::test]
    async fn test_empty_item_plan_is_an_internal_error() {
        let store = MockStore::new();
        let request = item_request(ItemPlan::default());

        let err = ActionDispatcher::new(&store).dispatch(&request).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Internal(InternalError::NoActionSelected { resource: "item" })
        ));
        assert!(store.calls().is_empty());
    }
}
