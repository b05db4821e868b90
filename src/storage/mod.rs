//! Storage subsystem
//!
//! Abstract persistence of raw records with two variants: a local working
//! tree and a remote GitHub repository. The variant is chosen once per
//! process from the environment.
//!
//! # Design Principles
//!
//! - A read either yields a fully decoded record or an error
//! - A write either persists the whole record or nothing
//! - Backends move bytes; encoding lives in `record`

mod backend;
mod errors;
pub mod github;
mod layout;
mod local;
mod record;

use std::fmt;
use std::sync::Arc;

use tracing::info;

pub use backend::StorageBackend;
pub use errors::{StorageError, StorageResult};
pub use github::{GitHubBackend, GitHubConfig};
pub use layout::{RecordLayout, CONTENT_EXTENSION, DATA_EXTENSION};
pub use local::LocalBackend;
pub use record::{decode, encode, RawRecord, RecordLocator};

use crate::config::ContentConfig;
use crate::observability::Event;

/// Environment variable selecting the backend
pub const ENV_VAR: &str = "SITE_ENV";

/// Which backend variant serves records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Working tree on the local filesystem
    Local,
    /// Branch of a remote GitHub repository
    GitHub,
}

impl StorageKind {
    /// `development` selects the local tree; anything else the remote.
    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("development") => StorageKind::Local,
            _ => StorageKind::GitHub,
        }
    }

    /// Reads the selection signal from `SITE_ENV`
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(ENV_VAR).ok().as_deref())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Local => "local",
            StorageKind::GitHub => "github",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Constructs the selected backend.
pub fn open_backend(
    kind: StorageKind,
    config: &ContentConfig,
) -> StorageResult<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match kind {
        StorageKind::Local => Arc::new(LocalBackend::new(&config.root)),
        StorageKind::GitHub => Arc::new(GitHubBackend::new(config.github.to_backend_config()?)?),
    };

    match kind {
        StorageKind::Local => info!(
            event = %Event::BackendSelected,
            backend = %kind,
            root = %config.root.display(),
            "storage backend selected"
        ),
        StorageKind::GitHub => info!(
            event = %Event::BackendSelected,
            backend = %kind,
            repository = %format!("{}/{}", config.github.owner, config.github.repo),
            branch = %config.github.branch,
            "storage backend selected"
        ),
    }
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_signal() {
        assert_eq!(StorageKind::from_value(Some("development")), StorageKind::Local);
        assert_eq!(StorageKind::from_value(Some("production")), StorageKind::GitHub);
        assert_eq!(StorageKind::from_value(Some("")), StorageKind::GitHub);
        assert_eq!(StorageKind::from_value(None), StorageKind::GitHub);
    }

    #[test]
    fn test_open_local() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = ContentConfig {
            root: temp.path().to_path_buf(),
            ..ContentConfig::default()
        };
        let backend = open_backend(StorageKind::Local, &config).unwrap();
        assert_eq!(backend.kind(), StorageKind::Local);
    }

    #[test]
    fn test_open_github_without_token() {
        let backend = open_backend(StorageKind::GitHub, &ContentConfig::default()).unwrap();
        assert_eq!(backend.kind(), StorageKind::GitHub);
    }
}
