//! Centralized error handling module
//!
//! Validation errors, internal invariant faults and store transport faults
//! are distinct types so that callers can never confuse a bad flag with a
//! program bug.

pub mod context;
pub mod types;

pub use context::ErrorContextExt;
pub use types::{
    AppError, AppResult, InternalError, StoreError, StoreResult, ValidationError,
};
