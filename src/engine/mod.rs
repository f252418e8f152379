//! Command resolution and validation core
//!
//! Each invocation flows through the same stages:
//!
//! 1. **flags**: clap schemas binding the command line
//! 2. **validate**: mutual-exclusion rules producing a typed request
//! 3. **resolver**: parent creation or attachment by reference
//! 4. **dispatcher**: runs the selected action
//! 5. **outcome**: folds responses and pages into one result

pub mod dispatcher;
pub mod flags;
pub mod outcome;
pub mod request;
pub mod resolver;
pub mod validate;

pub use dispatcher::ActionDispatcher;
pub use flags::{ContainerFlags, DatabaseFlags, ItemFlags};
pub use outcome::{OperationOutcome, WriteKind};
pub use request::{
    ContainerRequest, DatabaseRequest, ItemPlan, ItemRequest, ItemWrite, ReadAction,
    ResourceKind, ResourceRequest, WriteAction,
};
pub use resolver::{Resolution, ResourceResolver};
pub use validate::FlagValidator;
