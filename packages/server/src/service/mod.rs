//! Asset-aware usuario service.
//!
//! Keeps a usuario's `image_url` and the file in the asset directory in step
//! across uploads and deletes. Mutations of one usuario are serialized through
//! [`EntityLocks`]; different usuarios proceed concurrently.

mod locks;
mod sweeper;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use common::ReplaceStrategy;
use common::storage::{AssetName, AssetStore, StorageError};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::models::usuario::{UsuarioDetail, UsuarioPayload};
use crate::store::UsuarioStore;

pub use locks::EntityLocks;
pub use sweeper::spawn_sweep_task;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Store(#[from] DbErr),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("an unspecified problem occurred while deleting usuario {0}")]
    DeleteFailed(i32),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Filename as sent by the client.
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Outcome of one orphan sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: Vec<AssetName>,
    /// Unreferenced assets kept because they are younger than the grace period.
    pub skipped_recent: usize,
    pub staging_purged: usize,
}

pub struct UsuarioService {
    store: Arc<dyn UsuarioStore>,
    assets: Arc<dyn AssetStore>,
    strategy: ReplaceStrategy,
    locks: EntityLocks,
}

impl UsuarioService {
    pub fn new(
        store: Arc<dyn UsuarioStore>,
        assets: Arc<dyn AssetStore>,
        strategy: ReplaceStrategy,
    ) -> Self {
        Self {
            store,
            assets,
            strategy,
            locks: EntityLocks::new(),
        }
    }

    pub fn assets(&self) -> &Arc<dyn AssetStore> {
        &self.assets
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<UsuarioDetail>> {
        Ok(self.store.get_all(true).await?)
    }

    pub async fn get_by_id(&self, id: i32) -> ServiceResult<Option<UsuarioDetail>> {
        Ok(self.store.get_by_id(id, true).await?)
    }

    pub async fn list_by_theme(&self, theme: &str) -> ServiceResult<Vec<UsuarioDetail>> {
        Ok(self.store.get_all_by_theme(theme, true).await?)
    }

    /// Create a usuario without an image, whatever `image_url` says.
    pub async fn create(&self, mut payload: UsuarioPayload) -> ServiceResult<Option<UsuarioDetail>> {
        payload.image_url = None;
        Ok(self.store.add(payload).await?)
    }

    /// Replace a usuario's fields. The stored image reference is kept; it
    /// only changes through [`UsuarioService::upload_image`].
    #[instrument(skip(self, payload))]
    pub async fn update(
        &self,
        id: i32,
        mut payload: UsuarioPayload,
    ) -> ServiceResult<Option<UsuarioDetail>> {
        payload.image_url = None;
        let _guard = self.locks.lock(id).await;
        Ok(self.store.update(id, payload).await?)
    }

    /// Delete a usuario, then its image.
    ///
    /// The image is only touched once the store confirms the record is gone.
    /// Returns the deleted usuario, or `None` if it did not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> ServiceResult<Option<UsuarioDetail>> {
        let _guard = self.locks.lock(id).await;

        let Some(usuario) = self.store.get_by_id(id, false).await? else {
            return Ok(None);
        };

        if !self.store.delete(id).await? {
            return Err(ServiceError::DeleteFailed(id));
        }

        if self.assets.delete(&usuario.image_url).await? {
            info!(usuario_id = id, asset = %usuario.image_url, "Removed image of deleted usuario");
        }

        Ok(Some(usuario))
    }

    /// Replace a usuario's image and persist the new reference.
    ///
    /// An empty upload leaves the image alone but still persists the usuario.
    /// Returns `None` if the usuario does not exist.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.data.len()))]
    pub async fn upload_image(
        &self,
        id: i32,
        upload: ImageUpload,
    ) -> ServiceResult<Option<UsuarioDetail>> {
        let _guard = self.locks.lock(id).await;

        let Some(usuario) = self.store.get_by_id(id, true).await? else {
            return Ok(None);
        };

        if upload.data.is_empty() {
            debug!(usuario_id = id, "Empty upload, keeping current image");
            return Ok(self.store.update(id, UsuarioPayload::from(usuario)).await?);
        }

        match self.strategy {
            ReplaceStrategy::DeleteThenStore => self.delete_then_store(usuario, upload).await,
            ReplaceStrategy::StoreThenSwap => self.store_then_swap(usuario, upload).await,
        }
    }

    async fn delete_then_store(
        &self,
        usuario: UsuarioDetail,
        upload: ImageUpload,
    ) -> ServiceResult<Option<UsuarioDetail>> {
        let id = usuario.id;

        if self.assets.delete(&usuario.image_url).await? {
            debug!(usuario_id = id, asset = %usuario.image_url, "Removed previous image");
        }

        let name = self.assets.store(&upload.data, &upload.file_name).await?;
        info!(usuario_id = id, asset = %name, "Stored image");

        let mut payload = UsuarioPayload::from(usuario);
        payload.image_url = Some(name.into_string());
        Ok(self.store.update(id, payload).await?)
    }

    async fn store_then_swap(
        &self,
        usuario: UsuarioDetail,
        upload: ImageUpload,
    ) -> ServiceResult<Option<UsuarioDetail>> {
        let id = usuario.id;
        let previous = usuario.image_url.clone();

        let name = self.assets.store(&upload.data, &upload.file_name).await?;
        info!(usuario_id = id, asset = %name, "Stored image");

        let mut payload = UsuarioPayload::from(usuario);
        payload.image_url = Some(name.to_string());

        let updated = match self.store.update(id, payload).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.discard(&name).await;
                return Ok(None);
            }
            Err(e) => {
                self.discard(&name).await;
                return Err(e.into());
            }
        };

        match self.assets.delete(&previous).await {
            Ok(true) => debug!(usuario_id = id, asset = %previous, "Removed previous image"),
            Ok(false) => {}
            Err(e) => warn!(
                usuario_id = id,
                asset = %previous,
                error = %e,
                "Failed to remove previous image, leaving it for the orphan sweep"
            ),
        }

        Ok(Some(updated))
    }

    /// Best-effort removal of an asset nothing references.
    async fn discard(&self, name: &AssetName) {
        if let Err(e) = self.assets.delete(name.as_str()).await {
            warn!(asset = %name, error = %e, "Failed to remove unreferenced image, leaving it for the orphan sweep");
        }
    }

    /// Remove asset files no usuario references.
    ///
    /// Files younger than `grace` are kept so an upload that has written its
    /// file but not yet persisted the reference is never swept.
    #[instrument(skip(self))]
    pub async fn sweep_orphans(&self, grace: Duration) -> ServiceResult<SweepReport> {
        let staging_purged = self.assets.purge_staging(grace).await?;

        // List before reading references: anything stored afterwards is not a candidate.
        let entries = self.assets.list().await?;
        let referenced = self.store.referenced_images().await?;
        let now = SystemTime::now();

        let mut report = SweepReport {
            scanned: entries.len(),
            staging_purged,
            ..Default::default()
        };

        for entry in entries {
            if referenced.contains(entry.name.as_str()) {
                continue;
            }
            let age = now.duration_since(entry.modified).unwrap_or(Duration::ZERO);
            if age < grace {
                report.skipped_recent += 1;
                continue;
            }
            if self.assets.delete(entry.name.as_str()).await? {
                report.removed.push(entry.name);
            }
        }

        Ok(report)
    }
}
