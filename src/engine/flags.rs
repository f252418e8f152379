//! Flag schemas for the three resource commands
//!
//! Long and short names are part of the public command line surface and
//! must stay stable.

use clap::Args;

use super::request::{DEFAULT_PARTITION_PATH, DEFAULT_THROUGHPUT};

pub const CREATE_ID: &str = "--create-id";
pub const DELETE_ID: &str = "--delete-id";
pub const CREATE_ITEM: &str = "--create-item";
pub const LIST_ALL: &str = "--list-all";
pub const SQL_QUERY: &str = "--sql-query";
pub const START_TIME: &str = "--start-time";
pub const STOP_TIME: &str = "--stop-time";
pub const DATABASE_ID: &str = "--database-id";
pub const CONTAINER_ID: &str = "--container-id";
pub const PARTITION_PATH: &str = "--partition-path";
pub const PARTITION_KEY: &str = "--partition-key";

/// Flags of the `database` command
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseFlags {
    /// Create a database with this id (succeeds if it already exists)
    #[arg(short = 'c', long = "create-id", value_name = "ID")]
    pub create_id: Option<String>,

    /// Delete the database with this id
    #[arg(short = 'd', long = "delete-id", value_name = "ID")]
    pub delete_id: Option<String>,
}

/// Flags of the `container` command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ContainerFlags {
    /// Create the database first if it does not exist
    #[arg(short = 'i', long = "init-db")]
    pub init_db: bool,

    /// Id of the database holding the container
    #[arg(long = "database-id", visible_alias = "db", value_name = "ID")]
    pub database_id: String,

    /// Partition key path used when creating the container
    #[arg(short = 'p', long = "partition-path", value_name = "PATH", default_value = DEFAULT_PARTITION_PATH)]
    pub partition_path: String,

    /// Create a container with this id (succeeds if it already exists)
    #[arg(short = 'c', long = "create-id", value_name = "ID")]
    pub create_id: Option<String>,

    /// Delete the container with this id
    #[arg(short = 'd', long = "delete-id", value_name = "ID")]
    pub delete_id: Option<String>,

    /// Provisioned throughput (RU/s) used when creating the container
    #[arg(short = 't', long = "throughput", value_name = "RU", default_value_t = DEFAULT_THROUGHPUT)]
    pub throughput: u32,
}

/// Flags of the `item` command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ItemFlags {
    /// Create the database and container first if they do not exist
    #[arg(short = 'i', long = "init-all")]
    pub init_all: bool,

    /// List every item modified within the time window
    #[arg(short = 'l', long = "list-all")]
    pub list_all: bool,

    /// Start of the list window (epoch seconds or RFC 3339); unbounded if omitted
    #[arg(long = "start-time", visible_alias = "start", value_name = "TIME")]
    pub start_time: Option<String>,

    /// End of the list window (epoch seconds or RFC 3339); unbounded if omitted
    #[arg(long = "stop-time", visible_alias = "stop", value_name = "TIME")]
    pub stop_time: Option<String>,

    /// SQL query to run against the container
    #[arg(short = 'q', long = "sql-query", value_name = "SQL")]
    pub sql_query: Option<String>,

    /// Id of the database holding the container
    #[arg(long = "database-id", visible_aliases = ["did", "db"], value_name = "ID")]
    pub database_id: String,

    /// Id of the container holding the items
    #[arg(long = "container-id", visible_alias = "cid", value_name = "ID")]
    pub container_id: String,

    /// Partition key path used when the container has to be created
    #[arg(long = "partition-path", value_name = "PATH", default_value = DEFAULT_PARTITION_PATH)]
    pub partition_path: String,

    /// Partition key value; defaults to the item id on delete
    #[arg(short = 'p', long = "partition-key", value_name = "KEY")]
    pub partition_key: Option<String>,

    /// JSON document to create
    #[arg(short = 'c', long = "create-item", value_name = "JSON")]
    pub create_item: Option<String>,

    /// Id of the item to delete
    #[arg(short = 'd', long = "delete-id", value_name = "ID")]
    pub delete_id: Option<String>,

    /// Provisioned throughput (RU/s) used when the container has to be created
    #[arg(short = 't', long = "throughput", value_name = "RU", default_value_t = DEFAULT_THROUGHPUT)]
    pub throughput: u32,
}

impl ContainerFlags {
    /// Flags with every optional value at its default
    pub fn new(database_id: impl Into<String>) -> Self {
        Self {
            init_db: false,
            database_id: database_id.into(),
            partition_path: DEFAULT_PARTITION_PATH.to_string(),
            create_id: None,
            delete_id: None,
            throughput: DEFAULT_THROUGHPUT,
        }
    }
}

impl ItemFlags {
    /// Flags with every optional value at its default
    pub fn new(database_id: impl Into<String>, container_id: impl Into<String>) -> Self {
        Self {
            init_all: false,
            list_all: false,
            start_time: None,
            stop_time: None,
            sql_query: None,
            database_id: database_id.into(),
            container_id: container_id.into(),
            partition_path: DEFAULT_PARTITION_PATH.to_string(),
            partition_key: None,
            create_item: None,
            delete_id: None,
            throughput: DEFAULT_THROUGHPUT,
        }
    }
}
