//! # Storage Backend Trait
//!
//! Implementations move bytes. Record encoding, decoding and layout
//! matching are shared by the provided methods.

use async_trait::async_trait;

use super::errors::StorageResult;
use super::layout::RecordLayout;
use super::record::{self, RawRecord, RecordLocator};
use super::StorageKind;

/// Backend trait for content storage
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Which variant this is
    fn kind(&self) -> StorageKind;

    /// Paths of the files directly inside `directory`; empty if it does not exist
    async fn list_dir(&self, directory: &str) -> StorageResult<Vec<String>>;

    /// Read the file at path
    async fn read_bytes(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Replace the file at path as a whole
    async fn write_bytes(&self, path: &str, data: &[u8]) -> StorageResult<()>;

    /// Delete the file at path
    async fn remove(&self, path: &str) -> StorageResult<()>;

    /// Locators of every record of a layout, sorted by path
    async fn list(&self, layout: &RecordLayout) -> StorageResult<Vec<RecordLocator>> {
        let mut locators: Vec<_> = self
            .list_dir(layout.directory())
            .await?
            .iter()
            .filter_map(|path| layout.match_path(path))
            .collect();
        locators.sort();
        Ok(locators)
    }

    /// Read and decode a record
    async fn read(&self, locator: &RecordLocator) -> StorageResult<RawRecord> {
        let bytes = self.read_bytes(locator.path()).await?;
        record::decode(locator, &bytes)
    }

    /// Encode and persist a record
    async fn write(&self, locator: &RecordLocator, raw: &RawRecord) -> StorageResult<()> {
        let bytes = record::encode(locator, raw)?;
        self.write_bytes(locator.path(), &bytes).await
    }

    /// Delete a record
    async fn delete(&self, locator: &RecordLocator) -> StorageResult<()> {
        self.remove(locator.path()).await
    }
}
