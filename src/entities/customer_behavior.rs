use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "customer_behavior")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub total_visits: i32,
    pub total_purchases: i32,
    pub total_spent: Decimal,
    pub favorite_store_id: Option<Uuid>,
    pub favorite_categories: Json,
    pub preferred_shopping_time: Option<String>,
    /// Minutes.
    pub average_session_duration: i32,
    pub last_visit: Option<DateTime<Utc>>,
    pub last_purchase: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
