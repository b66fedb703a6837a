//! Entity store for usuarios.
//!
//! The store owns persistence of usuario records and their social links. It
//! reports absence with `None`/`false` and reserves `Err` for real faults.

mod db;
mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::models::usuario::{UsuarioDetail, UsuarioPayload};

pub use db::SeaOrmUsuarioStore;
pub use memory::MemoryUsuarioStore;

pub type StoreResult<T> = Result<T, DbErr>;

#[async_trait]
pub trait UsuarioStore: Send + Sync {
    async fn get_all(&self, include_related: bool) -> StoreResult<Vec<UsuarioDetail>>;

    async fn get_by_id(&self, id: i32, include_related: bool)
    -> StoreResult<Option<UsuarioDetail>>;

    async fn get_all_by_theme(
        &self,
        theme: &str,
        include_related: bool,
    ) -> StoreResult<Vec<UsuarioDetail>>;

    async fn add(&self, payload: UsuarioPayload) -> StoreResult<Option<UsuarioDetail>>;

    /// Replace a usuario. Returns `None` if it does not exist.
    async fn update(&self, id: i32, payload: UsuarioPayload)
    -> StoreResult<Option<UsuarioDetail>>;

    /// Delete a usuario and its social links. Returns `false` if nothing was deleted.
    async fn delete(&self, id: i32) -> StoreResult<bool>;

    /// Every non-empty image name currently referenced by a usuario.
    async fn referenced_images(&self) -> StoreResult<HashSet<String>>;
}
