//! Observability subsystem
//!
//! Structured logging through `tracing`. Events are explicit and typed;
//! each log line names its `Event`.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. Logs go to stderr; stdout carries command output only
//! 3. Log format and level come from the environment
//!
//! # Usage
//!
//! ```ignore
//! use sitecontent::observability::{self, Event};
//!
//! observability::init_logging();
//! tracing::info!(event = %Event::ConfigLoaded, "configuration loaded");
//! ```

mod events;

pub use events::Event;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Selects JSON log lines when set to `json`
pub const LOG_FORMAT_VAR: &str = "SITE_LOG_FORMAT";

/// Filter applied when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let json = std::env::var(LOG_FORMAT_VAR)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    if event.is_fatal() {
        error!(event = %event, "{}", event);
    } else {
        info!(event = %event, "{}", event);
    }
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let rendered = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    if event.is_fatal() {
        error!(event = %event, fields = %rendered, "{}", event);
    } else {
        info!(event = %event, fields = %rendered, "{}", event);
    }
}

/// Log a record excluded from consumer results
pub fn log_rejection(schema: &str, locator: &str, reason: &str) {
    warn!(
        event = %Event::RecordRejected,
        schema,
        locator,
        reason,
        "record rejected"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init_logging();
        init_logging();
    }

    #[test]
    fn test_log_event() {
        // This just verifies no panic
        log_event(Event::ConfigLoaded);
        log_event(Event::RegistryFailed);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("root", "/tmp/test")]);
        log_rejection("posts", "src/content/posts/a.mdoc", "title: required field is missing");
    }
}
