use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Order in which an entity's image is replaced on re-upload.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceStrategy {
    /// Remove the old asset, write the new one, then persist the entity.
    /// Never holds two files at once; a crash in between leaves the entity
    /// pointing at a missing file.
    DeleteThenStore,
    /// Write the new asset, persist the entity, then remove the old asset.
    /// A crash in between leaves an unreferenced file for the orphan sweep.
    #[default]
    StoreThenSwap,
}

/// App-level asset storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AssetStorageConfig {
    /// Root that `images_dir` is resolved against. Default: ".".
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,
    /// Asset directory relative to `content_root`. Default: "Resources/images".
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    /// Largest accepted upload in bytes. Default: 10 MiB.
    #[serde(default = "default_max_asset_size")]
    pub max_asset_size: u64,
    #[serde(default)]
    pub replace_strategy: ReplaceStrategy,
    /// Unreferenced assets younger than this are left alone by the sweep. Default: 300.
    #[serde(default = "default_orphan_grace_secs")]
    pub orphan_grace_secs: u64,
    /// Interval between orphan sweeps; 0 disables the periodic sweep. Default: 3600.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Run one sweep before serving requests. Default: true.
    #[serde(default = "default_sweep_on_startup")]
    pub sweep_on_startup: bool,
}

fn default_content_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_images_dir() -> PathBuf {
    PathBuf::from("Resources/images")
}
fn default_max_asset_size() -> u64 {
    10 * 1024 * 1024
}
fn default_orphan_grace_secs() -> u64 {
    300
}
fn default_sweep_interval_secs() -> u64 {
    3600
}
fn default_sweep_on_startup() -> bool {
    true
}

impl AssetStorageConfig {
    /// Directory holding every asset file.
    pub fn asset_dir(&self) -> PathBuf {
        self.content_root.join(&self.images_dir)
    }

    pub fn orphan_grace(&self) -> Duration {
        Duration::from_secs(self.orphan_grace_secs)
    }

    /// `None` when the periodic sweep is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

impl Default for AssetStorageConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            images_dir: default_images_dir(),
            max_asset_size: default_max_asset_size(),
            replace_strategy: ReplaceStrategy::default(),
            orphan_grace_secs: default_orphan_grace_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_on_startup: default_sweep_on_startup(),
        }
    }
}
