use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

/// Per store, per day aggregate. Regenerating a day overwrites the row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "daily_sales_reports")]
#[schema(as = DailySalesReport)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub store_id: Uuid,
    pub report_date: NaiveDate,
    pub total_transactions: i32,
    pub total_revenue: Decimal,
    pub total_vat: Decimal,
    pub unique_customers: i32,
    pub new_customers: i32,
    pub total_items_sold: i32,
    pub average_basket_size: Decimal,
    #[schema(value_type = Object)]
    pub payment_breakdown: Json,
    pub successful_recognitions: i32,
    pub failed_recognitions: i32,
    pub average_confidence: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
