use async_trait::async_trait;
use futures::stream;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use super::traits::{
    ContainerProperties, ContainerRef, DatabaseRef, Document, DocumentStore, FeedPage,
    FeedStream, QuerySpec, RetryConfig, StatusCode, StoreResponse,
};
use crate::config::StoreConfig;
use crate::errors::{StoreError, StoreResult};

const HEADER_DATE: &str = "x-ms-date";
const HEADER_VERSION: &str = "x-ms-version";
const HEADER_REQUEST_CHARGE: &str = "x-ms-request-charge";
const HEADER_CONTINUATION: &str = "x-ms-continuation";
const HEADER_RETRY_AFTER_MS: &str = "x-ms-retry-after-ms";
const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const HEADER_IS_QUERY: &str = "x-ms-documentdb-isquery";
const HEADER_CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
const HEADER_OFFER_THROUGHPUT: &str = "x-ms-offer-throughput";

const CONTENT_JSON: &str = "application/json";
const CONTENT_QUERY: &str = "application/query+json";

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct CosmosClientConfig {
    pub endpoint_uri: String,
    pub auth_token: Option<String>,
    pub api_version: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    pub retry_config: RetryConfig,
}

impl Default for CosmosClientConfig {
    fn default() -> Self {
        Self {
            endpoint_uri: "https://localhost:8081/".to_string(),
            auth_token: None,
            api_version: "2018-12-31".to_string(),
            timeout_secs: 30,
            user_agent: Some("CosmosConsoleClient".to_string()),
            retry_config: RetryConfig::default(),
        }
    }
}

impl CosmosClientConfig {
    /// Build client settings from the `[store]` configuration section
    pub fn from_store_config(endpoint_uri: &str, config: &StoreConfig) -> Self {
        Self {
            endpoint_uri: endpoint_uri.to_string(),
            auth_token: config.auth_token.clone(),
            api_version: config.api_version.clone(),
            timeout_secs: config.timeout_secs,
            user_agent: Some(config.application_name.clone()),
            retry_config: RetryConfig::exponential(
                config.max_retry_attempts,
                config.retry_base_delay_ms,
            ),
        }
    }
}

/// Raw HTTP answer before it is shaped into a response or a page
struct RawResponse {
    status: StatusCode,
    request_charge: f64,
    continuation: Option<String>,
    body: Option<Value>,
}

impl RawResponse {
    fn into_store_response(self) -> StoreResponse {
        StoreResponse {
            status: self.status,
            request_charge: self.request_charge,
            body: self.body,
        }
    }
}

/// Body sent with a request, with its content type
struct RequestBody {
    content_type: &'static str,
    bytes: Vec<u8>,
}

impl RequestBody {
    fn json(value: &impl serde::Serialize, content_type: &'static str) -> StoreResult<Self> {
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::MalformedResponse {
            context: "failed to encode request body".to_string(),
            source: Some(Box::new(e)),
        })?;
        Ok(Self {
            content_type,
            bytes,
        })
    }
}

/// REST client for a Cosmos DB account
///
/// Every status the service answers with is returned as a response; only
/// transport failures become errors. Throttled (429) and unavailable (503)
/// answers are retried here with exponential backoff, preferring the
/// service's own `x-ms-retry-after-ms` hint.
pub struct CosmosClient {
    client: Client,
    base_url: Url,
    config: CosmosClientConfig,
}

impl CosmosClient {
    pub fn new(config: CosmosClientConfig) -> StoreResult<Self> {
        let base_url =
            Url::parse(&config.endpoint_uri).map_err(|source| StoreError::InvalidEndpoint {
                url: config.endpoint_uri.clone(),
                source,
            })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidEndpoint {
                url: config.endpoint_uri.clone(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }

        let mut client_builder =
            Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(user_agent) = &config.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        }
        let client = client_builder
            .build()
            .map_err(|source| StoreError::ClientBuild { source })?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Resource URL with every id percent-encoded as its own path segment
    fn resource_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Value for the authorization header.
    ///
    /// A token that is already a complete `type=...&ver=...&sig=...` string
    /// (a resource token) is used as is; anything else is treated as an AAD
    /// bearer token.
    fn authorization_value(token: &str) -> String {
        let token = token.trim();
        let raw = if token.starts_with("type=") {
            token.to_string()
        } else {
            format!("type=aad&ver=1.0&sig={}", token)
        };
        url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
    }

    fn build_headers(&self) -> StoreResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        insert_header(&mut headers, HEADER_DATE, &date)?;
        insert_header(&mut headers, HEADER_VERSION, &self.config.api_version)?;

        if let Some(token) = &self.config.auth_token {
            let value = HeaderValue::from_str(&Self::authorization_value(token)).map_err(
                |source| StoreError::InvalidHeader {
                    header: "authorization",
                    source,
                },
            )?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// Send one logical request, retrying throttled attempts
    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        extra_headers: HeaderMap,
        body: Option<RequestBody>,
    ) -> StoreResult<RawResponse> {
        let url = self.resource_url(segments);
        let retry = &self.config.retry_config;
        let mut attempt = 0;

        loop {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .headers(self.build_headers()?)
                .headers(extra_headers.clone());
            if let Some(body) = &body {
                request = request
                    .header(CONTENT_TYPE, body.content_type)
                    .body(body.bytes.clone());
            }

            debug!("{} {} (attempt {})", method, url, attempt + 1);
            let response = request.send().await.map_err(|source| StoreError::Request {
                method: method.to_string(),
                url: url.to_string(),
                source,
            })?;

            let status = response.status();
            if RetryConfig::is_retryable(status) && attempt < retry.max_attempts {
                let delay = retry_after(response.headers())
                    .unwrap_or_else(|| retry.calculate_delay(attempt));
                warn!(
                    "{} {} answered {}, retrying in {:?}",
                    method, url, status, delay
                );
                sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Self::read_response(&method, &url, response).await;
        }
    }

    async fn read_response(
        method: &Method,
        url: &Url,
        response: reqwest::Response,
    ) -> StoreResult<RawResponse> {
        let status = response.status();
        let headers = response.headers();
        let request_charge = headers
            .get(HEADER_REQUEST_CHARGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        let continuation = headers
            .get(HEADER_CONTINUATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|source| StoreError::Request {
            method: method.to_string(),
            url: url.to_string(),
            source,
        })?;

        let body = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Some(value),
                Err(e) if status.is_success() => {
                    return Err(StoreError::MalformedResponse {
                        context: format!("{} {} returned invalid JSON", method, url),
                        source: Some(Box::new(e)),
                    });
                }
                // Error bodies are informational only
                Err(_) => None,
            }
        };

        debug!("{} {} -> {} ({} RU)", method, url, status, request_charge);
        Ok(RawResponse {
            status,
            request_charge,
            continuation,
            body,
        })
    }

    /// Read a resource, and create it when the read answers 404.
    ///
    /// A 409 from the create means someone else won the race; the resource
    /// is read again so the caller sees OK. Charges of every call are summed.
    async fn read_or_create(
        &self,
        read_segments: &[&str],
        create_segments: &[&str],
        create_headers: HeaderMap,
        create_body: Value,
    ) -> StoreResult<StoreResponse> {
        let read = self
            .execute(Method::GET, read_segments, HeaderMap::new(), None)
            .await?;
        if read.status != StatusCode::NOT_FOUND {
            return Ok(read.into_store_response());
        }

        let mut charge = read.request_charge;
        let created = self
            .execute(
                Method::POST,
                create_segments,
                create_headers,
                Some(RequestBody::json(&create_body, CONTENT_JSON)?),
            )
            .await?;
        charge += created.request_charge;
        if created.status != StatusCode::CONFLICT {
            let mut response = created.into_store_response();
            response.request_charge = charge;
            return Ok(response);
        }

        let reread = self
            .execute(Method::GET, read_segments, HeaderMap::new(), None)
            .await?;
        charge += reread.request_charge;
        let mut response = reread.into_store_response();
        response.request_charge = charge;
        Ok(response)
    }

    /// Partition key value for a new item, as the JSON header value
    ///
    /// Returns the container read response instead when the container's
    /// partition path had to be looked up and that lookup failed.
    async fn partition_key_for(
        &self,
        container: &ContainerRef,
        item: &Document,
        partition_key: Option<&str>,
    ) -> StoreResult<Result<(String, f64), StoreResponse>> {
        if let Some(key) = partition_key {
            return Ok(Ok((partition_key_header(&Value::String(key.to_string())), 0.0)));
        }

        if let Some(path) = container.partition_path() {
            return Ok(Ok((partition_key_header(&partition_key_value(item, path)), 0.0)));
        }

        let read = self
            .execute(
                Method::GET,
                &["dbs", container.database_id(), "colls", container.id()],
                HeaderMap::new(),
                None,
            )
            .await?;
        if !read.status.is_success() {
            return Ok(Err(read.into_store_response()));
        }

        let path = read
            .body
            .as_ref()
            .and_then(|body| body.pointer("/partitionKey/paths/0"))
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::MalformedResponse {
                context: format!("container '{}' has no partition key definition", container.id()),
                source: None,
            })?;
        Ok(Ok((
            partition_key_header(&partition_key_value(item, path)),
            read.request_charge,
        )))
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> StoreResult<()> {
    let value = HeaderValue::from_str(value)
        .map_err(|source| StoreError::InvalidHeader { header: name, source })?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(HEADER_RETRY_AFTER_MS)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Value of `item` at a partition path such as `/id` or `/address/city`.
///
/// A missing value maps to the empty object, which the service treats as
/// the "undefined" partition key.
pub(crate) fn partition_key_value(item: &Document, path: &str) -> Value {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let first = match segments.next() {
        Some(first) => first,
        None => return json!({}),
    };

    let mut current = match item.get(first) {
        Some(value) => value,
        None => return json!({}),
    };
    for segment in segments {
        current = match current.get(segment) {
            Some(value) => value,
            None => return json!({}),
        };
    }
    current.clone()
}

fn partition_key_header(value: &Value) -> String {
    Value::Array(vec![value.clone()]).to_string()
}

fn documents_of(body: Option<Value>) -> Vec<Document> {
    let documents = match body {
        Some(Value::Object(mut map)) => map.remove("Documents"),
        _ => None,
    };
    match documents {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(document) => Some(document),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl DocumentStore for CosmosClient {
    async fn create_database_if_not_exists(&self, id: &str) -> StoreResult<StoreResponse> {
        self.read_or_create(&["dbs", id], &["dbs"], HeaderMap::new(), json!({ "id": id }))
            .await
    }

    async fn delete_database(&self, database: &DatabaseRef) -> StoreResult<StoreResponse> {
        let raw = self
            .execute(Method::DELETE, &["dbs", database.id()], HeaderMap::new(), None)
            .await?;
        Ok(raw.into_store_response())
    }

    async fn create_container_if_not_exists(
        &self,
        database: &DatabaseRef,
        properties: &ContainerProperties,
    ) -> StoreResult<StoreResponse> {
        let mut headers = HeaderMap::new();
        insert_header(
            &mut headers,
            HEADER_OFFER_THROUGHPUT,
            &properties.throughput.to_string(),
        )?;
        let body = json!({
            "id": properties.id,
            "partitionKey": {
                "paths": [properties.partition_path],
                "kind": "Hash",
                "version": 2,
            },
        });

        self.read_or_create(
            &["dbs", database.id(), "colls", properties.id.as_str()],
            &["dbs", database.id(), "colls"],
            headers,
            body,
        )
        .await
    }

    async fn delete_container(&self, container: &ContainerRef) -> StoreResult<StoreResponse> {
        let raw = self
            .execute(
                Method::DELETE,
                &["dbs", container.database_id(), "colls", container.id()],
                HeaderMap::new(),
                None,
            )
            .await?;
        Ok(raw.into_store_response())
    }

    async fn create_item(
        &self,
        container: &ContainerRef,
        item: &Document,
        partition_key: Option<&str>,
    ) -> StoreResult<StoreResponse> {
        let (key, lookup_charge) =
            match self.partition_key_for(container, item, partition_key).await? {
                Ok(found) => found,
                Err(failed_lookup) => return Ok(failed_lookup),
            };

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, HEADER_PARTITION_KEY, &key)?;
        let raw = self
            .execute(
                Method::POST,
                &["dbs", container.database_id(), "colls", container.id(), "docs"],
                headers,
                Some(RequestBody::json(item, CONTENT_JSON)?),
            )
            .await?;

        let mut response = raw.into_store_response();
        response.request_charge += lookup_charge;
        Ok(response)
    }

    async fn delete_item(
        &self,
        container: &ContainerRef,
        id: &str,
        partition_key: &str,
    ) -> StoreResult<StoreResponse> {
        let mut headers = HeaderMap::new();
        insert_header(
            &mut headers,
            HEADER_PARTITION_KEY,
            &partition_key_header(&Value::String(partition_key.to_string())),
        )?;
        let raw = self
            .execute(
                Method::DELETE,
                &["dbs", container.database_id(), "colls", container.id(), "docs", id],
                headers,
                None,
            )
            .await?;
        Ok(raw.into_store_response())
    }

    fn query_items<'a>(&'a self, container: &'a ContainerRef, query: QuerySpec) -> FeedStream<'a> {
        // State: None once the feed is exhausted, Some(token) while pages remain
        let initial: Option<Option<String>> = Some(None);

        Box::pin(stream::try_unfold(initial, move |state| {
            let query = query.clone();
            async move {
                let continuation = match state {
                    Some(continuation) => continuation,
                    None => return Ok::<_, StoreError>(None),
                };

                let mut headers = HeaderMap::new();
                insert_header(&mut headers, HEADER_IS_QUERY, "True")?;
                insert_header(&mut headers, HEADER_CROSS_PARTITION, "True")?;
                if let Some(token) = &continuation {
                    insert_header(&mut headers, HEADER_CONTINUATION, token)?;
                }

                let raw = self
                    .execute(
                        Method::POST,
                        &["dbs", container.database_id(), "colls", container.id(), "docs"],
                        headers,
                        Some(RequestBody::json(&query, CONTENT_QUERY)?),
                    )
                    .await?;

                let next = if raw.status.is_success() {
                    raw.continuation.map(Some)
                } else {
                    None
                };
                let page = FeedPage {
                    status: raw.status,
                    request_charge: raw.request_charge,
                    documents: documents_of(raw.body),
                };
                Ok::<_, StoreError>(Some((page, next)))
            }
        }))
    }

    async fn close(&self) {
        debug!("closing store client for {}", self.base_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> CosmosClient {
        CosmosClient::new(CosmosClientConfig {
            endpoint_uri: endpoint.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = CosmosClient::new(CosmosClientConfig {
            endpoint_uri: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(StoreError::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_resource_url_encodes_ids() {
        let client = client("https://acct.documents.azure.com:443/");
        let url = client.resource_url(&["dbs", "my db", "colls", "a/b"]);
        assert_eq!(
            url.as_str(),
            "https://acct.documents.azure.com/dbs/my%20db/colls/a%2Fb"
        );
    }

    #[test]
    fn test_authorization_value() {
        assert_eq!(
            CosmosClient::authorization_value("abc"),
            "type%3Daad%26ver%3D1.0%26sig%3Dabc"
        );
        assert_eq!(
            CosmosClient::authorization_value("type=resource&ver=1.0&sig=xyz"),
            "type%3Dresource%26ver%3D1.0%26sig%3Dxyz"
        );
    }

    #[test]
    fn test_partition_key_value() {
        let item: Document = serde_json::from_value(json!({
            "id": "abc",
            "address": { "city": "Oslo" },
            "count": 3
        }))
        .unwrap();

        assert_eq!(partition_key_value(&item, "/id"), json!("abc"));
        assert_eq!(partition_key_value(&item, "/address/city"), json!("Oslo"));
        assert_eq!(partition_key_value(&item, "/count"), json!(3));
        assert_eq!(partition_key_value(&item, "/missing"), json!({}));
        assert_eq!(partition_key_value(&item, "/"), json!({}));
    }

    #[test]
    fn test_partition_key_header() {
        assert_eq!(partition_key_header(&json!("abc")), r#"["abc"]"#);
        assert_eq!(partition_key_header(&json!(7)), "[7]");
    }

    #[test]
    fn test_documents_of_skips_non_objects() {
        let body = json!({ "Documents": [{ "id": "1" }, 5, { "id": "2" }], "_count": 3 });
        let documents = documents_of(Some(body));
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[1]["id"], "2");
        assert!(documents_of(None).is_empty());
    }
}
