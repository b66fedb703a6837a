use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usuario")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub theme: String,
    pub location: String,
    pub event_date: Option<DateTimeUtc>,
    pub attendees: i32,
    pub phone: Option<String>,
    pub email: Option<String>,

    /// Asset file name inside the image directory. Empty when there is no image.
    pub image_url: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
