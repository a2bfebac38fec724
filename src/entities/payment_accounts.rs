use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema, DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(10))")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "MPESA")]
    Mpesa,
    #[sea_orm(string_value = "AIRTEL")]
    Airtel,
    #[sea_orm(string_value = "TKASH")]
    Tkash,
    #[sea_orm(string_value = "CARD")]
    Card,
    #[sea_orm(string_value = "BANK")]
    Bank,
    #[sea_orm(string_value = "CASH")]
    Cash,
}

impl PaymentMethod {
    pub fn is_mobile_money(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Mpesa | PaymentMethod::Airtel | PaymentMethod::Tkash
        )
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Mpesa => write!(f, "MPESA"),
            PaymentMethod::Airtel => write!(f, "AIRTEL"),
            PaymentMethod::Tkash => write!(f, "TKASH"),
            PaymentMethod::Card => write!(f, "CARD"),
            PaymentMethod::Bank => write!(f, "BANK"),
            PaymentMethod::Cash => write!(f, "CASH"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, ToSchema)]
#[sea_orm(table_name = "payment_accounts")]
#[schema(as = PaymentAccount)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_method: PaymentMethod,
    pub account_number: String,
    pub account_name: String,
    pub provider_reference: Option<String>,
    pub is_primary: bool,
    pub is_verified: bool,
    pub is_active: bool,
    pub daily_limit: Decimal,
    pub transaction_limit: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
