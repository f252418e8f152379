//! In-memory document store for tests
//!
//! `MockStore` keeps databases, containers and items in memory with the
//! same create-if-not-exists and status-code behavior as the real service,
//! records every call it receives, and can serve a scripted sequence of
//! pages to exercise multi-page reads or fail item writes at the transport.

use async_trait::async_trait;
use futures::stream;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::cosmos::partition_key_value;
use super::traits::{
    ContainerProperties, ContainerRef, DatabaseRef, Document, DocumentStore, FeedPage,
    FeedStream, QuerySpec, StatusCode, StoreResponse,
};
use crate::errors::{StoreError, StoreResult};

/// Charge billed by the mock for every single-response operation
pub const MOCK_REQUEST_CHARGE: f64 = 1.0;

/// A call received by the mock, in order of arrival
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    CreateDatabase(String),
    DeleteDatabase(String),
    CreateContainer {
        database: String,
        id: String,
        partition_path: String,
        throughput: u32,
    },
    DeleteContainer {
        database: String,
        id: String,
    },
    CreateItem {
        database: String,
        container: String,
        item: Document,
        partition_key: Option<String>,
    },
    DeleteItem {
        database: String,
        container: String,
        id: String,
        partition_key: String,
    },
    Query {
        database: String,
        container: String,
        query: QuerySpec,
    },
    Close,
}

#[derive(Debug, Default)]
struct MockContainer {
    partition_path: String,
    items: Vec<(Value, Document)>,
}

#[derive(Debug, Default)]
struct MockState {
    databases: BTreeMap<String, BTreeMap<String, MockContainer>>,
    calls: Vec<StoreCall>,
    scripted_pages: Option<Vec<FeedPage>>,
    database_rejection: Option<StatusCode>,
    failing_writes: bool,
    next_rid: u64,
}

#[derive(Debug, Default)]
pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing database
    pub fn with_database(self, id: &str) -> Self {
        self.state().databases.entry(id.to_string()).or_default();
        self
    }

    /// Seed an existing container (and its database)
    pub fn with_container(self, database: &str, id: &str, partition_path: &str) -> Self {
        self.state()
            .databases
            .entry(database.to_string())
            .or_default()
            .insert(
                id.to_string(),
                MockContainer {
                    partition_path: partition_path.to_string(),
                    items: Vec::new(),
                },
            );
        self
    }

    /// Serve these pages, in order, for every query instead of the stored items
    pub fn with_pages(self, pages: Vec<FeedPage>) -> Self {
        self.state().scripted_pages = Some(pages);
        self
    }

    /// Answer every database creation with this status instead of creating it
    pub fn rejecting_databases(self, status: StatusCode) -> Self {
        self.state().database_rejection = Some(status);
        self
    }

    /// Fail every item write with a transport error after recording it
    pub fn failing_item_writes(self) -> Self {
        self.state().failing_writes = true;
        self
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    /// Calls excluding the final `close`
    pub fn data_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| *call != StoreCall::Close)
            .collect()
    }

    pub fn has_database(&self, id: &str) -> bool {
        self.state().databases.contains_key(id)
    }

    pub fn has_container(&self, database: &str, id: &str) -> bool {
        self.state()
            .databases
            .get(database)
            .map(|containers| containers.contains_key(id))
            .unwrap_or(false)
    }

    /// Ids of the items stored in a container
    pub fn item_ids(&self, database: &str, container: &str) -> Vec<String> {
        self.state()
            .databases
            .get(database)
            .and_then(|containers| containers.get(container))
            .map(|c| {
                c.items
                    .iter()
                    .filter_map(|(_, doc)| doc.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn respond(status: StatusCode) -> StoreResponse {
        StoreResponse::new(status, MOCK_REQUEST_CHARGE)
    }

    /// Response carrying a container definition, as the service returns it
    fn respond_with_container(
        status: StatusCode,
        id: &str,
        partition_path: &str,
    ) -> StoreResponse {
        let mut response = Self::respond(status);
        response.body = Some(json!({
            "id": id,
            "partitionKey": { "paths": [partition_path], "kind": "Hash" },
        }));
        response
    }

    fn transport_fault(&self, operation: &str) -> StoreResult<()> {
        if self.state().failing_writes {
            return Err(StoreError::MalformedResponse {
                context: format!("connection reset during {}", operation),
                source: None,
            });
        }
        Ok(())
    }

    fn create_database(&self, id: &str) -> StoreResponse {
        let mut state = self.state();
        state.calls.push(StoreCall::CreateDatabase(id.to_string()));
        if let Some(status) = state.database_rejection {
            return Self::respond(status);
        }
        if state.databases.contains_key(id) {
            return Self::respond(StatusCode::OK);
        }
        state.databases.insert(id.to_string(), BTreeMap::new());
        Self::respond(StatusCode::CREATED)
    }

    fn remove_database(&self, id: &str) -> StoreResponse {
        let mut state = self.state();
        state.calls.push(StoreCall::DeleteDatabase(id.to_string()));
        match state.databases.remove(id) {
            Some(_) => Self::respond(StatusCode::NO_CONTENT),
            None => Self::respond(StatusCode::NOT_FOUND),
        }
    }

    fn create_container(&self, database: &str, properties: &ContainerProperties) -> StoreResponse {
        let mut state = self.state();
        state.calls.push(StoreCall::CreateContainer {
            database: database.to_string(),
            id: properties.id.clone(),
            partition_path: properties.partition_path.clone(),
            throughput: properties.throughput,
        });
        let containers = match state.databases.get_mut(database) {
            Some(containers) => containers,
            None => return Self::respond(StatusCode::NOT_FOUND),
        };
        if let Some(existing) = containers.get(&properties.id) {
            return Self::respond_with_container(
                StatusCode::OK,
                &properties.id,
                &existing.partition_path,
            );
        }
        containers.insert(
            properties.id.clone(),
            MockContainer {
                partition_path: properties.partition_path.clone(),
                items: Vec::new(),
            },
        );
        Self::respond_with_container(
            StatusCode::CREATED,
            &properties.id,
            &properties.partition_path,
        )
    }

    fn remove_container(&self, database: &str, id: &str) -> StoreResponse {
        let mut state = self.state();
        state.calls.push(StoreCall::DeleteContainer {
            database: database.to_string(),
            id: id.to_string(),
        });
        match state
            .databases
            .get_mut(database)
            .and_then(|containers| containers.remove(id))
        {
            Some(_) => Self::respond(StatusCode::NO_CONTENT),
            None => Self::respond(StatusCode::NOT_FOUND),
        }
    }

    fn insert_item(
        &self,
        container: &ContainerRef,
        item: &Document,
        partition_key: Option<&str>,
    ) -> StoreResponse {
        let mut state = self.state();
        state.calls.push(StoreCall::CreateItem {
            database: container.database_id().to_string(),
            container: container.id().to_string(),
            item: item.clone(),
            partition_key: partition_key.map(str::to_string),
        });

        state.next_rid += 1;
        let rid = state.next_rid;
        let target = match state
            .databases
            .get_mut(container.database_id())
            .and_then(|containers| containers.get_mut(container.id()))
        {
            Some(target) => target,
            None => return Self::respond(StatusCode::NOT_FOUND),
        };

        let id = match item.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => return Self::respond(StatusCode::BAD_REQUEST),
        };
        let key = match partition_key {
            Some(key) => Value::String(key.to_string()),
            None => partition_key_value(item, &target.partition_path),
        };
        let exists = target.items.iter().any(|(existing_key, doc)| {
            *existing_key == key && doc.get("id").and_then(Value::as_str) == Some(id.as_str())
        });
        if exists {
            return Self::respond(StatusCode::CONFLICT);
        }

        let mut stored = item.clone();
        stored.insert("_rid".to_string(), json!(format!("rid{}", rid)));
        stored.insert(
            "_self".to_string(),
            json!(format!(
                "dbs/{}/colls/{}/docs/{}",
                container.database_id(),
                container.id(),
                id
            )),
        );
        stored.insert("_etag".to_string(), json!(format!("\"etag-{}\"", rid)));
        stored.insert("_attachments".to_string(), json!("attachments/"));
        stored.insert("_ts".to_string(), json!(chrono::Utc::now().timestamp()));
        target.items.push((key, stored));

        Self::respond(StatusCode::CREATED)
    }

    fn remove_item(
        &self,
        container: &ContainerRef,
        id: &str,
        partition_key: &str,
    ) -> StoreResponse {
        let mut state = self.state();
        state.calls.push(StoreCall::DeleteItem {
            database: container.database_id().to_string(),
            container: container.id().to_string(),
            id: id.to_string(),
            partition_key: partition_key.to_string(),
        });

        let target = match state
            .databases
            .get_mut(container.database_id())
            .and_then(|containers| containers.get_mut(container.id()))
        {
            Some(target) => target,
            None => return Self::respond(StatusCode::NOT_FOUND),
        };

        let key = Value::String(partition_key.to_string());
        let position = target.items.iter().position(|(existing_key, doc)| {
            *existing_key == key && doc.get("id").and_then(Value::as_str) == Some(id)
        });
        match position {
            Some(index) => {
                target.items.remove(index);
                Self::respond(StatusCode::NO_CONTENT)
            }
            None => Self::respond(StatusCode::NOT_FOUND),
        }
    }

    fn pages_for(&self, container: &ContainerRef, query: QuerySpec) -> Vec<FeedPage> {
        let mut state = self.state();
        state.calls.push(StoreCall::Query {
            database: container.database_id().to_string(),
            container: container.id().to_string(),
            query,
        });

        if let Some(pages) = &state.scripted_pages {
            return pages.clone();
        }

        // The mock does not evaluate query text: every stored item matches
        match state
            .databases
            .get(container.database_id())
            .and_then(|containers| containers.get(container.id()))
        {
            Some(target) => vec![FeedPage {
                status: StatusCode::OK,
                request_charge: MOCK_REQUEST_CHARGE,
                documents: target.items.iter().map(|(_, doc)| doc.clone()).collect(),
            }],
            None => vec![FeedPage {
                status: StatusCode::NOT_FOUND,
                request_charge: MOCK_REQUEST_CHARGE,
                documents: Vec::new(),
            }],
        }
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn create_database_if_not_exists(&self, id: &str) -> StoreResult<StoreResponse> {
        Ok(self.create_database(id))
    }

    async fn delete_database(&self, database: &DatabaseRef) -> StoreResult<StoreResponse> {
        Ok(self.remove_database(database.id()))
    }

    async fn create_container_if_not_exists(
        &self,
        database: &DatabaseRef,
        properties: &ContainerProperties,
    ) -> StoreResult<StoreResponse> {
        Ok(self.create_container(database.id(), properties))
    }

    async fn delete_container(&self, container: &ContainerRef) -> StoreResult<StoreResponse> {
        Ok(self.remove_container(container.database_id(), container.id()))
    }

    async fn create_item(
        &self,
        container: &ContainerRef,
        item: &Document,
        partition_key: Option<&str>,
    ) -> StoreResult<StoreResponse> {
        let response = self.insert_item(container, item, partition_key);
        self.transport_fault("item create")?;
        Ok(response)
    }

    async fn delete_item(
        &self,
        container: &ContainerRef,
        id: &str,
        partition_key: &str,
    ) -> StoreResult<StoreResponse> {
        let response = self.remove_item(container, id, partition_key);
        self.transport_fault("item delete")?;
        Ok(response)
    }

    fn query_items<'a>(&'a self, container: &'a ContainerRef, query: QuerySpec) -> FeedStream<'a> {
        let pages = self.pages_for(container, query);
        Box::pin(stream::iter(pages.into_iter().map(Ok)))
    }

    async fn close(&self) {
        self.state().calls.push(StoreCall::Close);
    }
}
