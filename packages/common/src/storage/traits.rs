use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::name::AssetName;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// A file currently present in the asset directory.
#[derive(Debug, Clone)]
pub struct AssetEntry {
    pub name: AssetName,
    pub size: u64,
    pub modified: SystemTime,
}

/// Named image asset storage.
///
/// Names are generated by the store on write; callers only ever hand back
/// names the store produced earlier (or an empty string for "no asset").
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Write a new asset derived from `original_name` and return its name.
    ///
    /// The asset is fully written when this returns. An existing file is
    /// never overwritten.
    async fn store(&self, data: &[u8], original_name: &str) -> Result<AssetName, StorageError>;

    /// Remove an asset by name.
    ///
    /// Returns `true` if a file was removed. An empty name, a name that cannot
    /// refer to a file in the asset directory, or a missing file is a no-op
    /// returning `false`.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    /// Check whether an asset exists. Invalid names never exist.
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Open an asset for streaming.
    async fn get_stream(&self, name: &AssetName) -> Result<BoxReader, StorageError>;

    /// Read all bytes of an asset.
    async fn get(&self, name: &AssetName) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(name).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// List every asset file.
    async fn list(&self) -> Result<Vec<AssetEntry>, StorageError>;

    /// Remove staging files left behind by interrupted writes.
    ///
    /// Returns the number of files removed.
    async fn purge_staging(&self, older_than: Duration) -> Result<usize, StorageError>;
}
