use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, ToSchema)]
#[sea_orm(table_name = "store_inventory")]
#[schema(as = StoreInventory)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub store_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub reorder_level: i32,
    pub max_stock_level: i32,
    pub shelf_location: Option<String>,
    pub aisle: Option<String>,
    pub is_available: bool,
    pub last_restocked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    pub fn in_stock(&self) -> bool {
        self.is_available && self.quantity > 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
