use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{StoreResult, UsuarioStore};
use crate::models::usuario::{SocialLink, SocialLinkPayload, UsuarioDetail, UsuarioPayload};

/// In-process store, selected with `database.url = "memory"`.
///
/// Nothing survives a restart; useful for local runs and tests.
#[derive(Debug, Default)]
pub struct MemoryUsuarioStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i32,
    last_link_id: i32,
    rows: BTreeMap<i32, UsuarioDetail>,
}

impl MemoryState {
    fn links(&mut self, payloads: Vec<SocialLinkPayload>) -> Vec<SocialLink> {
        payloads
            .into_iter()
            .map(|link| {
                self.last_link_id += 1;
                SocialLink {
                    id: self.last_link_id,
                    name: link.name,
                    url: link.url,
                }
            })
            .collect()
    }
}

impl MemoryUsuarioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn project(detail: &UsuarioDetail, include_related: bool) -> UsuarioDetail {
    let mut detail = detail.clone();
    if !include_related {
        detail.social_links.clear();
    }
    detail
}

#[async_trait]
impl UsuarioStore for MemoryUsuarioStore {
    async fn get_all(&self, include_related: bool) -> StoreResult<Vec<UsuarioDetail>> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .values()
            .map(|d| project(d, include_related))
            .collect())
    }

    async fn get_by_id(
        &self,
        id: i32,
        include_related: bool,
    ) -> StoreResult<Option<UsuarioDetail>> {
        let state = self.state.read().await;
        Ok(state.rows.get(&id).map(|d| project(d, include_related)))
    }

    async fn get_all_by_theme(
        &self,
        theme: &str,
        include_related: bool,
    ) -> StoreResult<Vec<UsuarioDetail>> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .values()
            .filter(|d| d.theme == theme)
            .map(|d| project(d, include_related))
            .collect())
    }

    async fn add(&self, payload: UsuarioPayload) -> StoreResult<Option<UsuarioDetail>> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let id = state.last_id;
        let social_links = state.links(payload.social_links);

        let detail = UsuarioDetail {
            id,
            theme: payload.theme,
            location: payload.location,
            event_date: payload.event_date,
            attendees: payload.attendees,
            phone: payload.phone,
            email: payload.email,
            image_url: payload.image_url.unwrap_or_default(),
            created_at: Utc::now(),
            social_links,
        };
        state.rows.insert(id, detail.clone());
        Ok(Some(detail))
    }

    async fn update(
        &self,
        id: i32,
        payload: UsuarioPayload,
    ) -> StoreResult<Option<UsuarioDetail>> {
        let mut state = self.state.write().await;
        if !state.rows.contains_key(&id) {
            return Ok(None);
        }
        let social_links = state.links(payload.social_links);

        let Some(detail) = state.rows.get_mut(&id) else {
            return Ok(None);
        };
        detail.theme = payload.theme;
        detail.location = payload.location;
        detail.event_date = payload.event_date;
        detail.attendees = payload.attendees;
        detail.phone = payload.phone;
        detail.email = payload.email;
        if let Some(image_url) = payload.image_url {
            detail.image_url = image_url;
        }
        detail.social_links = social_links;
        Ok(Some(detail.clone()))
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.rows.remove(&id).is_some())
    }

    async fn referenced_images(&self) -> StoreResult<HashSet<String>> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .values()
            .filter(|d| !d.image_url.is_empty())
            .map(|d| d.image_url.clone())
            .collect())
    }
}
