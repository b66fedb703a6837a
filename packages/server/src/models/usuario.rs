use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{rede_social, usuario};

/// A usuario as returned by the API, with its related social links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsuarioDetail {
    #[schema(example = 5)]
    pub id: i32,
    #[serde(rename = "tema")]
    #[schema(example = "Rust")]
    pub theme: String,
    #[serde(rename = "local")]
    #[schema(example = "Belo Horizonte")]
    pub location: String,
    #[serde(rename = "dataEvento")]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(rename = "qtdPessoas")]
    #[schema(example = 250)]
    pub attendees: i32,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Name of the image asset, empty when the usuario has no image.
    #[serde(rename = "imagemURL")]
    #[schema(example = "photo1234567890.png")]
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "redesSociais")]
    pub social_links: Vec<SocialLink>,
}

impl UsuarioDetail {
    pub fn from_parts(model: usuario::Model, social_links: Vec<SocialLink>) -> Self {
        Self {
            id: model.id,
            theme: model.theme,
            location: model.location,
            event_date: model.event_date,
            attendees: model.attendees,
            phone: model.phone,
            email: model.email,
            image_url: model.image_url,
            created_at: model.created_at,
            social_links,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SocialLink {
    pub id: i32,
    #[serde(rename = "nome")]
    #[schema(example = "Instagram")]
    pub name: String,
    pub url: String,
}

impl From<rede_social::Model> for SocialLink {
    fn from(model: rede_social::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            url: model.url,
        }
    }
}

/// Full replacement body for create and update.
///
/// `imagemURL` is never read from a request body: create starts without an
/// image and update keeps the stored one. Images are changed through the
/// upload endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct UsuarioPayload {
    #[serde(rename = "tema")]
    pub theme: String,
    #[serde(rename = "local")]
    pub location: String,
    #[serde(rename = "dataEvento")]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(rename = "qtdPessoas")]
    pub attendees: i32,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "imagemURL", skip_deserializing)]
    #[schema(read_only)]
    pub image_url: Option<String>,
    #[serde(rename = "redesSociais")]
    pub social_links: Vec<SocialLinkPayload>,
}

impl From<UsuarioDetail> for UsuarioPayload {
    fn from(detail: UsuarioDetail) -> Self {
        Self {
            theme: detail.theme,
            location: detail.location,
            event_date: detail.event_date,
            attendees: detail.attendees,
            phone: detail.phone,
            email: detail.email,
            image_url: Some(detail.image_url),
            social_links: detail
                .social_links
                .into_iter()
                .map(|link| SocialLinkPayload {
                    name: link.name,
                    url: link.url,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SocialLinkPayload {
    #[serde(rename = "nome")]
    pub name: String,
    pub url: String,
}

/// Body returned by a successful delete.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeletedResponse {
    #[schema(example = "Deletado")]
    pub message: String,
}

impl DeletedResponse {
    pub fn new() -> Self {
        Self {
            message: "Deletado".into(),
        }
    }
}

impl Default for DeletedResponse {
    fn default() -> Self {
        Self::new()
    }
}
