//! sitecontent CLI entry point
//!
//! A minimal entrypoint that:
//! 1. Installs logging (stderr)
//! 2. Delegates parsing and dispatch to `cli::run`
//! 3. Exits with non-zero on failure
//!
//! The JSON outcome, error included, is printed by the CLI module.

use sitecontent::{cli, observability};

fn main() {
    observability::init_logging();
    if let Err(e) = cli::run() {
        tracing::error!(code = e.code_str(), "{}", e.message());
        std::process::exit(1);
    }
}
