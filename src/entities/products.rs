use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, ToSchema)]
#[sea_orm(table_name = "products")]
#[schema(as = Product)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub category_id: Uuid,
    #[sea_orm(unique)]
    pub barcode: String,
    #[sea_orm(unique)]
    pub sku: String,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub vat_rate: Decimal,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,
    pub country_of_origin: String,
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text", nullable)]
    pub visual_signature: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn price_with_vat(&self) -> Decimal {
        crate::services::pricing::gross_price(self.price, self.vat_rate)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
