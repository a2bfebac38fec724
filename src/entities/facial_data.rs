use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

/// Enrolled face profile. At most one row per user.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, ToSchema)]
#[sea_orm(table_name = "facial_data")]
#[schema(as = FacialData)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text")]
    pub face_encoding: String,
    pub registration_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub is_active: bool,
    pub confidence_threshold: Decimal,
    pub failed_recognition_attempts: i32,
    pub last_recognition_attempt: Option<DateTime<Utc>>,
    pub is_locked: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
