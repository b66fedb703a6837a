use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use super::error::StorageError;
use super::name::{AssetName, TokenClock};
use super::traits::{AssetEntry, AssetStore, BoxReader};
use crate::config::AssetStorageConfig;

/// How many fresh names are tried before giving up on a write.
const MAX_NAME_ATTEMPTS: usize = 8;

const STAGING_DIR: &str = ".tmp";

/// Filesystem-backed asset store.
///
/// Assets live directly in `{base_path}/{name}`. Writes are staged in
/// `{base_path}/.tmp` and linked into place once complete, so a name never
/// refers to a partially written file.
pub struct FilesystemAssetStore {
    base_path: PathBuf,
    max_size: u64,
    tokens: TokenClock,
}

impl FilesystemAssetStore {
    /// Create a new filesystem asset store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(STAGING_DIR)).await?;
        Ok(Self {
            base_path,
            max_size,
            tokens: TokenClock::new(),
        })
    }

    pub async fn from_config(config: &AssetStorageConfig) -> Result<Self, StorageError> {
        Self::new(config.asset_dir(), config.max_asset_size).await
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn asset_path(&self, name: &AssetName) -> PathBuf {
        self.base_path.join(name.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(STAGING_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn write_staged(&self, temp_path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let mut file = fs::File::create(temp_path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Link a staged file to the first free generated name.
    ///
    /// `hard_link` fails instead of replacing an existing file, so a name
    /// claimed by another writer is never clobbered.
    async fn publish(&self, temp_path: &Path, original_name: &str) -> Result<AssetName, StorageError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = AssetName::generate(original_name, self.tokens.next());
            let target = self.asset_path(&name);

            match fs::hard_link(temp_path, &target).await {
                Ok(()) => {
                    if let Err(e) = fs::remove_file(temp_path).await {
                        warn!(error = %e, path = %temp_path.display(), "Failed to remove staged file");
                    }
                    return Ok(name);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(asset = %name, "Asset name taken, generating another");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::NameExhausted {
            attempts: MAX_NAME_ATTEMPTS,
        })
    }

    #[cfg(test)]
    fn with_tokens(mut self, tokens: TokenClock) -> Self {
        self.tokens = tokens;
        self
    }
}

#[async_trait]
impl AssetStore for FilesystemAssetStore {
    async fn store(&self, data: &[u8], original_name: &str) -> Result<AssetName, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let temp_path = self.temp_path();
        let result = match self.write_staged(&temp_path, data).await {
            Ok(()) => self.publish(&temp_path, original_name).await,
            Err(e) => Err(e),
        };

        if result.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        }

        result
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        if name.is_empty() {
            return Ok(false);
        }

        let name = match AssetName::parse(name) {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, "Ignoring delete of invalid asset name");
                return Ok(false);
            }
        };

        match fs::remove_file(self.asset_path(&name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let Ok(name) = AssetName::parse(name) else {
            return Ok(false);
        };
        Ok(fs::try_exists(self.asset_path(&name)).await?)
    }

    async fn get_stream(&self, name: &AssetName) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.asset_path(name)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<AssetEntry>, StorageError> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Some(name) = entry
                .file_name()
                .to_str()
                .and_then(|s| AssetName::parse(s).ok())
            else {
                continue;
            };
            entries.push(AssetEntry {
                name,
                size: metadata.len(),
                modified: metadata.modified()?,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn purge_staging(&self, older_than: Duration) -> Result<usize, StorageError> {
        let mut removed = 0;
        let mut dir = fs::read_dir(self.base_path.join(STAGING_DIR)).await?;
        let now = SystemTime::now();

        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let age = now
                .duration_since(metadata.modified()?)
                .unwrap_or(Duration::ZERO);
            if age < older_than {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(removed)
    }
}
