//! CLI module for the QuakeC analyzer
//!
//! ## Commands
//!
//! - `check <root>` - Parse a project and report diagnostics
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling
//! `process::exit`. Only the top-level `run()` function handles errors and
//! exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use thiserror::Error;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Argument parsing
// ============================================================================

#[derive(Parser)]
#[command(name = "quakec", version, about = "QuakeC project analyzer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a QuakeC project and report diagnostics
    Check {
        /// Project root containing progs.src
        root: PathBuf,
        /// Grammar dialect: qcc or fteqcc
        #[arg(long, default_value = "qcc")]
        dialect: String,
    },
}

/// CLI entry point: parse arguments, dispatch, and exit.
pub fn run() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check { root, dialect } => commands::check(&root, &dialect),
    };

    match result {
        Ok(code) => process::exit(code.0),
        Err(error) => {
            eprintln!("error: {error}");
            process::exit(error.exit_code.0);
        }
    }
}
