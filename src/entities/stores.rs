use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
#[serde(rename_all = "UPPERCASE")]
pub enum StoreType {
    #[sea_orm(string_value = "UNMANNED")]
    Unmanned,
    #[sea_orm(string_value = "HYBRID")]
    Hybrid,
    #[sea_orm(string_value = "ASSISTED")]
    Assisted,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, ToSchema)]
#[sea_orm(table_name = "stores")]
#[schema(as = Store)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub store_code: String,
    pub store_type: StoreType,
    pub county_id: i32,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub phone_number: String,
    pub email: Option<String>,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    #[sea_orm(column_name = "is_24_hours")]
    pub is_24_hours: bool,
    pub is_active: bool,
    pub date_opened: NaiveDate,
    pub manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Trading hours check; a closing time before the opening time wraps past midnight.
    pub fn is_open_at(&self, time: NaiveTime) -> bool {
        if !self.is_active {
            return false;
        }
        if self.is_24_hours {
            return true;
        }
        if self.opening_time <= self.closing_time {
            self.opening_time <= time && time < self.closing_time
        } else {
            time >= self.opening_time || time < self.closing_time
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
