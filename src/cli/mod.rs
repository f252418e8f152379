//! CLI module providing command-line interface functionality
//!
//! This module handles argument parsing, per-invocation context, routing to
//! the resource handlers and rendering the report.

pub mod commands;
pub mod context;
pub mod handlers;
pub mod report;

use anyhow::Result;
use clap::Parser;
use std::io;
use std::process::ExitCode;

pub use commands::{Cli, Commands};
pub use context::CliContext;
pub use handlers::CommandHandler;

use crate::engine::OperationOutcome;
use crate::errors::{AppError, AppResult, ErrorContextExt};

/// Exit status of a rejected flag combination, same as clap usage errors
pub const VALIDATION_EXIT_CODE: u8 = 2;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Parse command line arguments and execute the requested command
    pub async fn run() -> Result<ExitCode> {
        let cli = Cli::parse();

        let context = CliContext::new(cli.config.clone(), cli.verbose)?;
        context.init_logging()?;

        let handler = CommandHandler::new(context);
        let result = handler.handle_command(cli.command).await;
        Self::finish(result)
    }

    /// Report an outcome and map it to the process exit status.
    ///
    /// Validation errors are printed as one line; other faults propagate.
    pub fn finish(result: AppResult<OperationOutcome>) -> Result<ExitCode> {
        match result {
            Ok(outcome) => {
                report::write_report(&mut io::stdout().lock(), &outcome)
                    .with_context("writing report")?;
                Ok(exit_code(&outcome))
            }
            Err(AppError::Validation(err)) => {
                eprintln!("Error: {}", err);
                Ok(ExitCode::from(VALIDATION_EXIT_CODE))
            }
            Err(err) => {
                tracing::error!(category = err.category(), "Command failed: {}", err);
                Err(err.into())
            }
        }
    }
}

/// 0 when the action succeeded, 1 otherwise
pub fn exit_code(outcome: &OperationOutcome) -> ExitCode {
    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
