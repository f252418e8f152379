//! Error types for the cosmos-console client
//!
//! Errors are split by who is responsible for them: the user (validation),
//! the program itself (internal invariants), the store transport, and the
//! local environment (configuration and I/O). Store-side failures such as a
//! missing database are *not* errors; they travel as status codes inside an
//! operation outcome.

use std::path::PathBuf;
use thiserror::Error;

/// Rejected flag combinations and malformed flag values.
///
/// Produced before any store connection is opened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Exactly one of '{create_flag}' or '{delete_flag}' must be specified")]
    CreateXorDelete {
        create_flag: &'static str,
        delete_flag: &'static str,
    },

    #[error("No operation specified; use one of {}", flags.join(", "))]
    NoOperation { flags: Vec<&'static str> },

    #[error("Choose only one of '{list_flag}' or '{query_flag}'")]
    ListXorQuery {
        list_flag: &'static str,
        query_flag: &'static str,
    },

    #[error("Value for '{flag}' must not be empty")]
    EmptyValue { flag: &'static str },

    #[error("Invalid item for '{flag}': {reason}")]
    InvalidItemPayload { flag: &'static str, reason: String },

    #[error("Invalid time for '{flag}': '{value}' is neither epoch seconds nor an RFC 3339 timestamp")]
    InvalidTime { flag: &'static str, value: String },
}

/// Program faults that validator-accepted input can never trigger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("no action selected for {resource} request")]
    NoActionSelected { resource: &'static str },
}

/// Transport-level failures raised by the store client.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid store endpoint '{url}'")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Request failed: {method} {url}")]
    Request {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid header value for '{header}'")]
    InvalidHeader {
        header: &'static str,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },

    #[error("Malformed response body: {context}")]
    MalformedResponse {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to build HTTP client")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

/// Convenience alias for store client results
pub type StoreResult<T> = Result<T, StoreError>;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Internal error: {0}")]
    Internal(#[from] InternalError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File I/O error for '{path}': {operation}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new Config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error is the user's fault rather than a fault of the program
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Internal(_) => "internal",
            Self::Store(_) => "store",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
            Self::Other { .. } => "other",
        }
    }
}
