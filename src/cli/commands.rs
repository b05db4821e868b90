//! CLI command implementations
//!
//! Boot sequence for every command:
//! 1. Load configuration
//! 2. Build the schema registry (fatal on any configuration error)
//! 3. Select and construct the storage backend
//! 4. Run the command on a current-thread runtime
//!
//! Each invocation prints exactly one JSON object on stdout.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ContentConfig;
use crate::content::ContentStore;
use crate::observability::{self, Event};
use crate::schema::SchemaRegistry;
use crate::storage::{self, StorageKind};
use crate::validation::{NormalizedRecord, SystemClock};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Parse arguments, run the command and print its outcome
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match execute(cli) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(&e)?;
            Err(e)
        }
    }
}

/// Boot and run one command, returning its `data` payload
pub fn execute(cli: Cli) -> CliResult<Value> {
    let config = ContentConfig::load_or_default(cli.config.as_deref())?;
    let root = config.root.display().to_string();
    observability::log_event_with_fields(Event::ConfigLoaded, &[("root", root.as_str())]);

    let registry = load_registry(&config)?;
    if let Command::Schema = cli.command {
        return Ok(serde_json::to_value(registry.to_declaration())?);
    }

    let backend = storage::open_backend(StorageKind::from_env(), &config)?;
    let store = ContentStore::new(Arc::new(registry), backend, Arc::new(SystemClock));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::runtime_error(e.to_string()))?;
    runtime.block_on(run_command(&store, cli.command))
}

/// Run a command against an open store
pub async fn run_command(store: &ContentStore, command: Command) -> CliResult<Value> {
    match command {
        Command::Check => check(store).await,
        Command::List { collection } => {
            let listing = store.list(&collection).await?;
            Ok(serde_json::to_value(&listing)?)
        }
        Command::Get {
            collection,
            identity,
        } => {
            let record = store.get(&collection, &identity).await?;
            record_view(store, &record)
        }
        Command::Singleton { name } => {
            let record = store.get_singleton(&name).await?;
            record_view(store, &record)
        }
        Command::Schema => Ok(serde_json::to_value(store.registry().to_declaration())?),
    }
}

/// Record JSON plus the display labels of its array fields
fn record_view(store: &ContentStore, record: &NormalizedRecord) -> CliResult<Value> {
    let mut value = serde_json::to_value(record)?;
    let labels = record.labels(store.registry().get(&record.schema)?);
    if !labels.is_empty() {
        if let Value::Object(map) = &mut value {
            map.insert("labels".into(), serde_json::to_value(labels)?);
        }
    }
    Ok(value)
}

/// Fails with the full report attached when anything is invalid
pub async fn check(store: &ContentStore) -> CliResult<Value> {
    let report = store.check().await?;
    let value = serde_json::to_value(&report)?;
    if report.is_clean() {
        Ok(value)
    } else {
        Err(CliError::check_failed(report.problem_count()).with_details(value))
    }
}

fn load_registry(config: &ContentConfig) -> CliResult<SchemaRegistry> {
    config.load_registry().map_err(|e| {
        let reason = e.to_string();
        observability::log_event_with_fields(Event::RegistryFailed, &[("error", reason.as_str())]);
        CliError::from(e)
    })
}
