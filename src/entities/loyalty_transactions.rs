use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(10))")]
#[serde(rename_all = "UPPERCASE")]
pub enum LoyaltyTransactionType {
    #[sea_orm(string_value = "EARN")]
    Earn,
    #[sea_orm(string_value = "REDEEM")]
    Redeem,
    #[sea_orm(string_value = "EXPIRE")]
    Expire,
    #[sea_orm(string_value = "ADJUST")]
    Adjust,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, ToSchema)]
#[sea_orm(table_name = "loyalty_transactions")]
#[schema(as = LoyaltyTransaction)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub loyalty_program_id: Uuid,
    pub transaction_type: LoyaltyTransactionType,
    pub points: i32,
    pub balance_after: i32,
    pub related_transaction_id: Option<Uuid>,
    pub description: String,
    pub expires_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
