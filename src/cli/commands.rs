//! Command definitions and structures for the CLI
//!
//! The three resource commands share the same shape: one flag schema each,
//! validated into a request before anything touches the store.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::{ContainerFlags, DatabaseFlags, ItemFlags};

/// Main CLI structure
#[derive(Parser, Debug)]
#[command(name = "cosmos-console")]
#[command(about = "Manage databases, containers and items in a Cosmos DB account")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ~/.cosmos-console/config.toml)
    #[arg(long, global = true, value_name = "PATH", env = "COSMOS_CONSOLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or delete a database
    Database(DatabaseFlags),

    /// Create or delete a container
    Container(ContainerFlags),

    /// Create, delete, list or query items
    Item(ItemFlags),
}
