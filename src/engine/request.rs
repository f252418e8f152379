//! Validated, typed requests
//!
//! A request is built once per invocation by the validator and never
//! mutated afterwards.

use std::fmt;

use crate::store::Document;

/// Earliest instant accepted as a list bound: 0001-01-01T00:00:00Z in epoch seconds
pub const MIN_TIMESTAMP: i64 = -62_135_596_800;
/// Latest instant accepted as a list bound: 9999-12-31T23:59:59Z in epoch seconds
pub const MAX_TIMESTAMP: i64 = 253_402_300_799;

/// Default partition path for new containers
pub const DEFAULT_PARTITION_PATH: &str = "/id";
/// Default provisioned throughput (RU/s) for new containers
pub const DEFAULT_THROUGHPUT: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Database,
    Container,
    Item,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database => write!(f, "database"),
            Self::Container => write!(f, "container"),
            Self::Item => write!(f, "item"),
        }
    }
}

/// Create or delete a database or container by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAction {
    Create(String),
    Delete(String),
}

/// Create or delete one item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemWrite {
    Create(Document),
    Delete(String),
}

/// Paginated read over a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadAction {
    /// Every item whose `_ts` lies within `[start, stop]`, in epoch seconds
    List { start: i64, stop: i64 },
    /// Query text passed through verbatim
    Query(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRequest {
    pub action: WriteAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRequest {
    pub init_database: bool,
    pub database_id: String,
    pub partition_path: String,
    pub throughput: u32,
    pub action: WriteAction,
}

/// What an item request does: an optional write followed by an optional read.
///
/// The write always runs first. A plan with neither is rejected by the
/// dispatcher as an internal error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemPlan {
    pub write: Option<ItemWrite>,
    pub read: Option<ReadAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRequest {
    pub init_parents: bool,
    pub database_id: String,
    pub container_id: String,
    pub partition_path: String,
    pub partition_key: Option<String>,
    pub throughput: u32,
    pub plan: ItemPlan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceRequest {
    Database(DatabaseRequest),
    Container(ContainerRequest),
    Item(ItemRequest),
}

impl ResourceRequest {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Database(_) => ResourceKind::Database,
            Self::Container(_) => ResourceKind::Container,
            Self::Item(_) => ResourceKind::Item,
        }
    }

    /// Short human description used in logs, e.g. `create database 'D'`
    pub fn describe(&self) -> String {
        fn write(action: &WriteAction, kind: ResourceKind) -> String {
            match action {
                WriteAction::Create(id) => format!("create {} '{}'", kind, id),
                WriteAction::Delete(id) => format!("delete {} '{}'", kind, id),
            }
        }

        match self {
            Self::Database(r) => write(&r.action, ResourceKind::Database),
            Self::Container(r) => write(&r.action, ResourceKind::Container),
            Self::Item(r) => {
                let mut steps = Vec::new();
                match &r.plan.write {
                    Some(ItemWrite::Create(_)) => steps.push("create item".to_string()),
                    Some(ItemWrite::Delete(id)) => steps.push(format!("delete item '{}'", id)),
                    None => {}
                }
                match &r.plan.read {
                    Some(ReadAction::List { start, stop }) => {
                        steps.push(format!("list items in [{}, {}]", start, stop))
                    }
                    Some(ReadAction::Query(_)) => steps.push("query items".to_string()),
                    None => {}
                }
                format!(
                    "{} in {}/{}",
                    steps.join(" then "),
                    r.database_id,
                    r.container_id
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_timestamp_bounds_match_calendar_limits() {
        let min = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
        let max = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(min.timestamp(), MIN_TIMESTAMP);
        assert_eq!(max.timestamp(), MAX_TIMESTAMP);
    }

    #[test]
    fn test_describe() {
        let request = ResourceRequest::Database(DatabaseRequest {
            action: WriteAction::Create("D".to_string()),
        });
        assert_eq!(request.kind(), ResourceKind::Database);
        assert_eq!(request.describe(), "create database 'D'");

        let request = ResourceRequest::Item(ItemRequest {
            init_parents: false,
            database_id: "D".to_string(),
            container_id: "C".to_string(),
            partition_path: DEFAULT_PARTITION_PATH.to_string(),
            partition_key: None,
            throughput: DEFAULT_THROUGHPUT,
            plan: ItemPlan {
                write: Some(ItemWrite::Delete("abc".to_string())),
                read: Some(ReadAction::Query("SELECT * FROM c".to_string())),
            },
        });
        assert_eq!(
            request.describe(),
            "delete item 'abc' then query items in D/C"
        );
    }
}
