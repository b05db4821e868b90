//! Observable events
//!
//! Every log line emitted at a subsystem boundary carries one of these as
//! its `event` field, so logs can be filtered by a stable name.

use std::fmt;

/// Observable events in sitecontent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot
    /// Configuration loaded
    ConfigLoaded,
    /// Schema registry populated and checked
    RegistryReady,
    /// Schema declaration rejected at boot (FATAL)
    RegistryFailed,
    /// Storage backend constructed
    BackendSelected,

    // Reads
    /// Collection snapshot built
    CollectionListed,
    /// Singleton read and validated
    SingletonLoaded,
    /// Record excluded from consumer results
    RecordRejected,

    // Writes
    /// Record persisted
    RecordWritten,
    /// Record deleted
    RecordDeleted,
    /// Write refused because the record does not validate
    WriteRejected,

    /// Full content check finished
    CheckComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::RegistryReady => "REGISTRY_READY",
            Event::RegistryFailed => "REGISTRY_FAILED",
            Event::BackendSelected => "BACKEND_SELECTED",
            Event::CollectionListed => "COLLECTION_LISTED",
            Event::SingletonLoaded => "SINGLETON_LOADED",
            Event::RecordRejected => "RECORD_REJECTED",
            Event::RecordWritten => "RECORD_WRITTEN",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::WriteRejected => "WRITE_REJECTED",
            Event::CheckComplete => "CHECK_COMPLETE",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::RegistryFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
