use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
#[serde(rename_all = "UPPERCASE")]
pub enum CameraType {
    #[sea_orm(string_value = "ENTRY")]
    Entry,
    #[sea_orm(string_value = "SHELF")]
    Shelf,
    #[sea_orm(string_value = "CHECKOUT")]
    Checkout,
    #[sea_orm(string_value = "SECURITY")]
    Security,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, ToSchema)]
#[sea_orm(table_name = "cameras")]
#[schema(as = Camera)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub store_id: Uuid,
    #[sea_orm(unique)]
    pub camera_code: String,
    pub camera_type: CameraType,
    pub ip_address: String,
    pub port: i32,
    pub stream_url: String,
    pub location_description: String,
    pub zone: Option<String>,
    pub is_active: bool,
    pub is_online: bool,
    pub last_ping: Option<DateTime<Utc>>,
    pub installation_date: NaiveDate,
    pub last_maintenance: Option<NaiveDate>,
    pub next_maintenance: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
