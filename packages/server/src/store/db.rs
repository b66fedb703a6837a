use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::{StoreResult, UsuarioStore};
use crate::entity::{rede_social, usuario};
use crate::models::usuario::{SocialLink, SocialLinkPayload, UsuarioDetail, UsuarioPayload};

/// PostgreSQL-backed store.
pub struct SeaOrmUsuarioStore {
    db: DatabaseConnection,
}

impl SeaOrmUsuarioStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UsuarioStore for SeaOrmUsuarioStore {
    #[instrument(skip(self))]
    async fn get_all(&self, include_related: bool) -> StoreResult<Vec<UsuarioDetail>> {
        let models = usuario::Entity::find()
            .order_by_asc(usuario::Column::Id)
            .all(&self.db)
            .await?;
        with_social_links(&self.db, models, include_related).await
    }

    #[instrument(skip(self))]
    async fn get_by_id(
        &self,
        id: i32,
        include_related: bool,
    ) -> StoreResult<Option<UsuarioDetail>> {
        let Some(model) = usuario::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let mut details = with_social_links(&self.db, vec![model], include_related).await?;
        Ok(details.pop())
    }

    #[instrument(skip(self))]
    async fn get_all_by_theme(
        &self,
        theme: &str,
        include_related: bool,
    ) -> StoreResult<Vec<UsuarioDetail>> {
        let models = usuario::Entity::find()
            .filter(usuario::Column::Theme.eq(theme))
            .order_by_asc(usuario::Column::Id)
            .all(&self.db)
            .await?;
        with_social_links(&self.db, models, include_related).await
    }

    #[instrument(skip(self, payload))]
    async fn add(&self, payload: UsuarioPayload) -> StoreResult<Option<UsuarioDetail>> {
        let txn = self.db.begin().await?;

        let model = usuario::ActiveModel {
            theme: Set(payload.theme),
            location: Set(payload.location),
            event_date: Set(payload.event_date),
            attendees: Set(payload.attendees),
            phone: Set(payload.phone),
            email: Set(payload.email),
            image_url: Set(payload.image_url.unwrap_or_default()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let links = insert_social_links(&txn, model.id, payload.social_links).await?;
        txn.commit().await?;

        Ok(Some(UsuarioDetail::from_parts(model, links)))
    }

    #[instrument(skip(self, payload))]
    async fn update(
        &self,
        id: i32,
        payload: UsuarioPayload,
    ) -> StoreResult<Option<UsuarioDetail>> {
        let txn = self.db.begin().await?;

        let Some(existing) = usuario::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active = existing.into_active_model();
        active.theme = Set(payload.theme);
        active.location = Set(payload.location);
        active.event_date = Set(payload.event_date);
        active.attendees = Set(payload.attendees);
        active.phone = Set(payload.phone);
        active.email = Set(payload.email);
        if let Some(image_url) = payload.image_url {
            active.image_url = Set(image_url);
        }
        let model = active.update(&txn).await?;

        rede_social::Entity::delete_many()
            .filter(rede_social::Column::UsuarioId.eq(id))
            .exec(&txn)
            .await?;
        let links = insert_social_links(&txn, id, payload.social_links).await?;

        txn.commit().await?;

        Ok(Some(UsuarioDetail::from_parts(model, links)))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let txn = self.db.begin().await?;

        rede_social::Entity::delete_many()
            .filter(rede_social::Column::UsuarioId.eq(id))
            .exec(&txn)
            .await?;
        let result = usuario::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    async fn referenced_images(&self) -> StoreResult<HashSet<String>> {
        let names: Vec<String> = usuario::Entity::find()
            .select_only()
            .column(usuario::Column::ImageUrl)
            .filter(usuario::Column::ImageUrl.ne(""))
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(names.into_iter().collect())
    }
}

/// Attach social links to each usuario with one extra query.
async fn with_social_links<C: ConnectionTrait>(
    db: &C,
    models: Vec<usuario::Model>,
    include_related: bool,
) -> StoreResult<Vec<UsuarioDetail>> {
    if !include_related || models.is_empty() {
        return Ok(models
            .into_iter()
            .map(|m| UsuarioDetail::from_parts(m, Vec::new()))
            .collect());
    }

    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    let links = rede_social::Entity::find()
        .filter(rede_social::Column::UsuarioId.is_in(ids))
        .order_by_asc(rede_social::Column::Id)
        .all(db)
        .await?;

    let mut by_owner: HashMap<i32, Vec<SocialLink>> = HashMap::new();
    for link in links {
        by_owner
            .entry(link.usuario_id)
            .or_default()
            .push(SocialLink::from(link));
    }

    Ok(models
        .into_iter()
        .map(|m| {
            let links = by_owner.remove(&m.id).unwrap_or_default();
            UsuarioDetail::from_parts(m, links)
        })
        .collect())
}

async fn insert_social_links<C: ConnectionTrait>(
    db: &C,
    usuario_id: i32,
    links: Vec<SocialLinkPayload>,
) -> StoreResult<Vec<SocialLink>> {
    let mut inserted = Vec::with_capacity(links.len());
    for link in links {
        let model = rede_social::ActiveModel {
            usuario_id: Set(usuario_id),
            name: Set(link.name),
            url: Set(link.url),
            ..Default::default()
        }
        .insert(db)
        .await?;
        inserted.push(SocialLink::from(model));
    }
    Ok(inserted)
}
