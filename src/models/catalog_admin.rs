use crate::entities::{CameraType, DiscountType, StoreType};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCountyRequest {
    #[schema(example = "Nairobi")]
    pub name: String,
    #[schema(example = "047")]
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    #[schema(example = "Fresh Milk")]
    pub name: String,
    /// Derived from the name when omitted.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStoreRequest {
    #[schema(example = "BiashAI Westlands")]
    pub name: String,
    #[schema(example = "NBO-001")]
    pub store_code: String,
    pub store_type: StoreType,
    pub county_id: i32,
    pub address: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    #[schema(example = "0712345678")]
    pub phone_number: String,
    pub email: Option<String>,
    /// Required unless the store trades around the clock.
    #[schema(example = "07:00:00")]
    pub opening_time: Option<NaiveTime>,
    #[schema(example = "22:00:00")]
    pub closing_time: Option<NaiveTime>,
    #[serde(default)]
    pub is_24_hours: bool,
    /// Today when omitted.
    pub date_opened: Option<NaiveDate>,
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub store_type: Option<StoreType>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
    pub is_24_hours: Option<bool>,
    pub is_active: Option<bool>,
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCameraRequest {
    #[schema(example = "NBO-001-ENT-1")]
    pub camera_code: String,
    pub camera_type: CameraType,
    #[schema(example = "10.20.0.11")]
    pub ip_address: String,
    pub port: Option<i32>,
    pub stream_url: String,
    pub location_description: String,
    pub zone: Option<String>,
    /// Today when omitted.
    pub installation_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCameraRequest {
    pub ip_address: Option<String>,
    pub port: Option<i32>,
    pub stream_url: Option<String>,
    pub location_description: Option<String>,
    pub zone: Option<String>,
    pub is_active: Option<bool>,
    /// Marking a camera online also stamps `last_ping`.
    pub is_online: Option<bool>,
    pub last_maintenance: Option<NaiveDate>,
    pub next_maintenance: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    #[schema(example = "Brookside Milk 500ml")]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    #[schema(example = "6161100230018")]
    pub barcode: String,
    #[schema(example = "DAI-0001")]
    pub sku: String,
    #[schema(example = "65.00")]
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    /// 16 when omitted.
    pub vat_rate: Option<Decimal>,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,
    pub country_of_origin: Option<String>,
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub brand: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInventoryRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub reorder_level: Option<i32>,
    pub max_stock_level: Option<i32>,
    pub shelf_location: Option<String>,
    pub aisle: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePromotionRequest {
    #[schema(example = "Weekend Dairy Deal")]
    pub name: String,
    #[schema(example = "DAIRY10")]
    pub code: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub minimum_purchase: Option<Decimal>,
    pub maximum_discount: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub usage_limit: Option<i32>,
    pub usage_per_customer: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdatePromotionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub discount_value: Option<Decimal>,
    pub maximum_discount: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub usage_limit: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStaffRoleRequest {
    pub is_staff: bool,
}
