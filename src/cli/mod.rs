//! CLI module for sitecontent
//!
//! Provides command-line interface for:
//! - check: Validate all stored content
//! - list: Valid records of a collection
//! - get: One record by identity
//! - singleton: A singleton record
//! - schema: Registered schemas

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, execute, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_response, response, write_error, write_response};
