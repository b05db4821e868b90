//! # Local Working Tree Backend
//!
//! Reads and writes records in a directory on disk. Writes land in a
//! sibling temp file that is renamed over the target, so a record is
//! either fully written or untouched.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::backend::StorageBackend;
use super::errors::{StorageError, StorageResult};
use super::StorageKind;

const TEMP_SUFFIX: &str = ".tmp";

/// Local filesystem storage backend
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a new local backend rooted at the working tree
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative `/` separated path under the root.
    fn full_path(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn not_found_or_io(path: &str, err: std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(path.to_string())
    } else {
        StorageError::Io(format!("{}: {}", path, err))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn kind(&self) -> StorageKind {
        StorageKind::Local
    }

    async fn list_dir(&self, directory: &str) -> StorageResult<Vec<String>> {
        let full_path = if directory.is_empty() {
            self.root.clone()
        } else {
            self.full_path(directory)?
        };

        let mut entries = match fs::read_dir(&full_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(not_found_or_io(directory, e)),
        };

        let mut results = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            if directory.is_empty() {
                results.push(name);
            } else {
                results.push(format!("{}/{}", directory, name));
            }
        }
        results.sort();
        Ok(results)
    }

    async fn read_bytes(&self, path: &str) -> StorageResult<Vec<u8>> {
        let full_path = self.full_path(path)?;
        fs::read(&full_path)
            .await
            .map_err(|e| not_found_or_io(path, e))
    }

    async fn write_bytes(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let full_path = self.full_path(path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut temp_name = full_path.as_os_str().to_owned();
        temp_name.push(TEMP_SUFFIX);
        let temp_path = PathBuf::from(temp_name);

        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(format!("{}: {}", path, e)));
        }
        if let Err(e) = fs::rename(&temp_path, &full_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(format!("{}: {}", path, e)));
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> StorageResult<()> {
        let full_path = self.full_path(path)?;
        fs::remove_file(&full_path)
            .await
            .map_err(|e| not_found_or_io(path, e))
    }
}
