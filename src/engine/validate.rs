//! Mutual-exclusion validation
//!
//! Turns parsed flags into a typed request, or rejects the combination
//! before any store connection exists. Validation is pure: it never
//! performs I/O.

use chrono::DateTime;
use serde_json::Value;

use super::flags::{
    ContainerFlags, DatabaseFlags, ItemFlags, CONTAINER_ID, CREATE_ID, CREATE_ITEM, DATABASE_ID,
    DELETE_ID, LIST_ALL, PARTITION_KEY, PARTITION_PATH, SQL_QUERY, START_TIME, STOP_TIME,
};
use super::request::{
    ContainerRequest, DatabaseRequest, ItemPlan, ItemRequest, ItemWrite, ReadAction,
    WriteAction, MAX_TIMESTAMP, MIN_TIMESTAMP,
};
use crate::errors::ValidationError;
use crate::store::Document;

/// Validation of one command's flag set into its typed request
pub trait FlagValidator {
    type Request;

    fn validate(self) -> Result<Self::Request, ValidationError>;
}

impl FlagValidator for DatabaseFlags {
    type Request = DatabaseRequest;

    fn validate(self) -> Result<DatabaseRequest, ValidationError> {
        let action = write_action(self.create_id, self.delete_id)?;
        Ok(DatabaseRequest { action })
    }
}

impl FlagValidator for ContainerFlags {
    type Request = ContainerRequest;

    fn validate(self) -> Result<ContainerRequest, ValidationError> {
        let action = write_action(self.create_id, self.delete_id)?;
        Ok(ContainerRequest {
            init_database: self.init_db,
            database_id: non_empty(self.database_id, DATABASE_ID)?,
            partition_path: non_empty(self.partition_path, PARTITION_PATH)?,
            throughput: self.throughput,
            action,
        })
    }
}

impl FlagValidator for ItemFlags {
    type Request = ItemRequest;

    fn validate(self) -> Result<ItemRequest, ValidationError> {
        let create = self.create_item.is_some();
        let delete = self.delete_id.is_some();
        let list = self.list_all;
        let query = self.sql_query.is_some();

        if !(create || delete || list || query) {
            return Err(ValidationError::NoOperation {
                flags: vec![CREATE_ITEM, DELETE_ID, LIST_ALL, SQL_QUERY],
            });
        }
        if list && query {
            return Err(ValidationError::ListXorQuery {
                list_flag: LIST_ALL,
                query_flag: SQL_QUERY,
            });
        }
        if !list && !query && !(create ^ delete) {
            return Err(ValidationError::CreateXorDelete {
                create_flag: CREATE_ITEM,
                delete_flag: DELETE_ID,
            });
        }

        // Create takes precedence when both writes accompany a read
        let write = match (self.create_item, self.delete_id) {
            (Some(payload), _) => Some(ItemWrite::Create(parse_item(&payload)?)),
            (None, Some(id)) => Some(ItemWrite::Delete(non_empty(id, DELETE_ID)?)),
            (None, None) => None,
        };

        let read = if list {
            let start = match &self.start_time {
                Some(value) => parse_time(value, START_TIME)?,
                None => MIN_TIMESTAMP,
            };
            let stop = match &self.stop_time {
                Some(value) => parse_time(value, STOP_TIME)?,
                None => MAX_TIMESTAMP,
            };
            Some(ReadAction::List { start, stop })
        } else {
            match self.sql_query {
                Some(sql) => Some(ReadAction::Query(non_empty(sql, SQL_QUERY)?)),
                None => None,
            }
        };

        let partition_key = match self.partition_key {
            Some(key) => Some(non_empty(key, PARTITION_KEY)?),
            None => None,
        };

        Ok(ItemRequest {
            init_parents: self.init_all,
            database_id: non_empty(self.database_id, DATABASE_ID)?,
            container_id: non_empty(self.container_id, CONTAINER_ID)?,
            partition_path: non_empty(self.partition_path, PARTITION_PATH)?,
            partition_key,
            throughput: self.throughput,
            plan: ItemPlan { write, read },
        })
    }
}

/// Exactly one of create or delete, each naming an id
fn write_action(
    create_id: Option<String>,
    delete_id: Option<String>,
) -> Result<WriteAction, ValidationError> {
    match (create_id, delete_id) {
        (Some(id), None) => Ok(WriteAction::Create(non_empty(id, CREATE_ID)?)),
        (None, Some(id)) => Ok(WriteAction::Delete(non_empty(id, DELETE_ID)?)),
        _ => Err(ValidationError::CreateXorDelete {
            create_flag: CREATE_ID,
            delete_flag: DELETE_ID,
        }),
    }
}

fn non_empty(value: String, flag: &'static str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyValue { flag })
    } else {
        Ok(value)
    }
}

/// Parse an item payload. Only structure is checked: it must be a JSON object.
fn parse_item(payload: &str) -> Result<Document, ValidationError> {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(ValidationError::InvalidItemPayload {
            flag: CREATE_ITEM,
            reason: "expected a JSON object".to_string(),
        }),
        Err(e) => Err(ValidationError::InvalidItemPayload {
            flag: CREATE_ITEM,
            reason: e.to_string(),
        }),
    }
}

/// Epoch seconds, or an RFC 3339 timestamp converted to epoch seconds
fn parse_time(value: &str, flag: &'static str) -> Result<i64, ValidationError> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<i64>() {
        return Ok(seconds);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|time| time.timestamp())
        .map_err(|_| ValidationError::InvalidTime {
            flag,
            value: value.to_string(),
        })
}
