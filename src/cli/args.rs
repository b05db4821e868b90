//! CLI argument definitions using clap
//!
//! Commands:
//! - sitecontent check
//! - sitecontent list <collection>
//! - sitecontent get <collection> <identity>
//! - sitecontent singleton <name>
//! - sitecontent schema

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sitecontent - validated content for the personal site
#[derive(Parser, Debug)]
#[command(name = "sitecontent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (default: ./sitecontent.json if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate every collection and singleton
    Check,

    /// List the valid records of a collection
    List {
        /// Collection name
        collection: String,
    },

    /// Fetch one record of a collection by identity
    Get {
        /// Collection name
        collection: String,

        /// Record identity (slug)
        identity: String,
    },

    /// Fetch a singleton record
    Singleton {
        /// Singleton name
        name: String,
    },

    /// Print the registered schemas as JSON
    Schema,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
