use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A social network link shown alongside a usuario.
/// Rows are owned by their usuario and replaced wholesale on update.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rede_social")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub usuario_id: i32,

    pub name: String,
    pub url: String,
}

impl ActiveModelBehavior for ActiveModel {}
