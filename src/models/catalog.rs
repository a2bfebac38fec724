use crate::entities::StoreType;
use crate::entities::counties::Model as County;
use crate::entities::product_categories::Model as ProductCategory;
use crate::entities::products::Model as Product;
use crate::entities::store_inventory::Model as StoreInventory;
use crate::entities::stores::Model as Store;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct StoreQuery {
    pub county: Option<i32>,
    pub store_type: Option<StoreType>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ProductQuery {
    pub category: Option<Uuid>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HomeStats {
    pub total_stores: u64,
    pub total_products: u64,
    pub active_sessions: u64,
}

/// A stocked product on a store's shelves.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryLine {
    pub inventory: StoreInventory,
    pub product: Product,
    pub needs_reorder: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreDetail {
    pub store: Store,
    pub county: Option<County>,
    pub products: Vec<InventoryLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreAvailability {
    pub store: Store,
    pub quantity: i32,
    pub shelf_location: Option<String>,
    pub aisle: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub category: Option<ProductCategory>,
    pub price_with_vat: Decimal,
    pub available_in: Vec<StoreAvailability>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoreStatus {
    pub store_id: Uuid,
    pub store_name: String,
    pub is_open: bool,
    pub active_sessions: u64,
    pub today_revenue: Decimal,
    pub cameras_online: u64,
    pub cameras_total: u64,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductAvailability {
    pub available: bool,
    pub quantity: i32,
    pub location: Option<String>,
    pub aisle: Option<String>,
}

impl ProductAvailability {
    pub fn from_inventory(inventory: Option<&StoreInventory>) -> Self {
        match inventory {
            Some(inv) => Self {
                available: inv.in_stock(),
                quantity: inv.quantity,
                location: inv.shelf_location.clone(),
                aisle: inv.aisle.clone(),
            },
            None => Self {
                available: false,
                quantity: 0,
                location: None,
                aisle: None,
            },
        }
    }
}
