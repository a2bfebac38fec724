use crate::entities::{
    CameraType, SessionStatus, TransactionStatus, camera_entity as cameras,
    county_entity as counties, product_category_entity as categories, product_entity as products,
    promotion_entity as promotions, shopping_session_entity as sessions,
    store_entity as stores, store_inventory_entity as inventory,
    transaction_entity as transactions,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{any_icontains, local_day_bounds, local_today};
use chrono::{Local, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const PRODUCTS_PAGE_SIZE: u64 = 24;
const STORE_DETAIL_LINES: u64 = 20;

#[derive(Debug, FromQueryResult)]
struct RevenueRow {
    revenue: Option<Decimal>,
}

/// Inventory rows paired with their products. With `active_only`, rows whose
/// product has been retired are dropped.
pub fn pair_with_products(
    rows: Vec<inventory::Model>,
    products: Vec<products::Model>,
    active_only: bool,
) -> Vec<InventoryLine> {
    let mut by_id: HashMap<Uuid, products::Model> =
        products.into_iter().map(|p| (p.id, p)).collect();
    rows.into_iter()
        .filter_map(|row| {
            let product = by_id.remove(&row.product_id)?;
            (product.is_active || !active_only).then(|| InventoryLine {
                needs_reorder: row.needs_reorder(),
                inventory: row,
                product,
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct CatalogService {
    pool: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    pub async fn home_stats(&self) -> AppResult<HomeStats> {
        let total_stores = stores::Entity::find()
            .filter(stores::Column::IsActive.eq(true))
            .count(self.pool.as_ref())
            .await?;
        let total_products = products::Entity::find()
            .filter(products::Column::IsActive.eq(true))
            .count(self.pool.as_ref())
            .await?;
        let active_sessions = sessions::Entity::find()
            .filter(sessions::Column::Status.eq(SessionStatus::Active))
            .count(self.pool.as_ref())
            .await?;
        Ok(HomeStats {
            total_stores,
            total_products,
            active_sessions,
        })
    }

    pub async fn counties(&self) -> AppResult<Vec<counties::Model>> {
        Ok(counties::Entity::find()
            .order_by_asc(counties::Column::Name)
            .all(self.pool.as_ref())
            .await?)
    }

    pub async fn top_level_categories(&self) -> AppResult<Vec<categories::Model>> {
        Ok(categories::Entity::find()
            .filter(categories::Column::IsActive.eq(true))
            .filter(categories::Column::ParentId.is_null())
            .order_by_asc(categories::Column::Name)
            .all(self.pool.as_ref())
            .await?)
    }

    pub async fn list_stores(&self, query: &StoreQuery) -> AppResult<Vec<stores::Model>> {
        let mut select = stores::Entity::find().filter(stores::Column::IsActive.eq(true));
        if let Some(county) = query.county {
            select = select.filter(stores::Column::CountyId.eq(county));
        }
        if let Some(store_type) = query.store_type {
            select = select.filter(stores::Column::StoreType.eq(store_type));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(any_icontains(
                &[
                    stores::Column::Name,
                    stores::Column::StoreCode,
                    stores::Column::Address,
                ],
                search,
            ));
        }
        Ok(select
            .order_by_asc(stores::Column::Name)
            .all(self.pool.as_ref())
            .await?)
    }

    async fn active_store(&self, store_id: Uuid) -> AppResult<stores::Model> {
        stores::Entity::find_by_id(store_id)
            .filter(stores::Column::IsActive.eq(true))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))
    }

    pub async fn store_detail(&self, store_id: Uuid) -> AppResult<StoreDetail> {
        let store = self.active_store(store_id).await?;
        let county = counties::Entity::find_by_id(store.county_id)
            .one(self.pool.as_ref())
            .await?;

        let rows = inventory::Entity::find()
            .filter(inventory::Column::StoreId.eq(store.id))
            .filter(inventory::Column::IsAvailable.eq(true))
            .filter(inventory::Column::Quantity.gt(0))
            .order_by_asc(inventory::Column::Aisle)
            .limit(STORE_DETAIL_LINES)
            .all(self.pool.as_ref())
            .await?;
        let product_ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
        let products = if product_ids.is_empty() {
            Vec::new()
        } else {
            products::Entity::find()
                .filter(products::Column::Id.is_in(product_ids))
                .all(self.pool.as_ref())
                .await?
        };

        Ok(StoreDetail {
            store,
            county,
            products: pair_with_products(rows, products, true),
        })
    }

    pub async fn list_products(
        &self,
        query: &ProductQuery,
    ) -> AppResult<PaginatedResponse<products::Model>> {
        let params = PaginationParams::with_page_size(query.page, PRODUCTS_PAGE_SIZE);

        let mut select = products::Entity::find().filter(products::Column::IsActive.eq(true));
        if let Some(category) = query.category {
            select = select.filter(products::Column::CategoryId.eq(category));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(any_icontains(
                &[
                    products::Column::Name,
                    products::Column::Barcode,
                    products::Column::Brand,
                ],
                search,
            ));
        }
        if let Some(min) = query.min_price {
            select = select.filter(products::Column::Price.gte(min));
        }
        if let Some(max) = query.max_price {
            select = select.filter(products::Column::Price.lte(max));
        }

        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_asc(products::Column::Name)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(self.pool.as_ref())
            .await?;

        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn product_detail(&self, product_id: Uuid) -> AppResult<ProductDetail> {
        let product = products::Entity::find_by_id(product_id)
            .filter(products::Column::IsActive.eq(true))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
        let category = categories::Entity::find_by_id(product.category_id)
            .one(self.pool.as_ref())
            .await?;

        let rows = inventory::Entity::find()
            .filter(inventory::Column::ProductId.eq(product.id))
            .filter(inventory::Column::IsAvailable.eq(true))
            .filter(inventory::Column::Quantity.gt(0))
            .all(self.pool.as_ref())
            .await?;
        let store_ids: Vec<Uuid> = rows.iter().map(|r| r.store_id).collect();
        let mut stores_by_id: HashMap<Uuid, stores::Model> = if store_ids.is_empty() {
            HashMap::new()
        } else {
            stores::Entity::find()
                .filter(stores::Column::Id.is_in(store_ids))
                .filter(stores::Column::IsActive.eq(true))
                .all(self.pool.as_ref())
                .await?
                .into_iter()
                .map(|s| (s.id, s))
                .collect()
        };
        let available_in = rows
            .into_iter()
            .filter_map(|row| {
                stores_by_id.remove(&row.store_id).map(|store| StoreAvailability {
                    store,
                    quantity: row.quantity,
                    shelf_location: row.shelf_location,
                    aisle: row.aisle,
                })
            })
            .collect();

        Ok(ProductDetail {
            price_with_vat: product.price_with_vat(),
            product,
            category,
            available_in,
        })
    }

    pub async fn active_promotions(&self) -> AppResult<Vec<promotions::Model>> {
        let now = Utc::now();
        Ok(promotions::Entity::find()
            .filter(promotions::Column::IsActive.eq(true))
            .filter(promotions::Column::StartDate.lte(now))
            .filter(promotions::Column::EndDate.gte(now))
            .order_by_asc(promotions::Column::EndDate)
            .all(self.pool.as_ref())
            .await?)
    }

    /// Live figures for a store's kiosk display.
    pub async fn store_status(&self, store_id: Uuid) -> AppResult<StoreStatus> {
        let store = stores::Entity::find_by_id(store_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

        let active_sessions = sessions::Entity::find()
            .filter(sessions::Column::StoreId.eq(store.id))
            .filter(sessions::Column::Status.eq(SessionStatus::Active))
            .count(self.pool.as_ref())
            .await?;

        let (start, end) = local_day_bounds(local_today());
        let today_revenue = transactions::Entity::find()
            .select_only()
            .column_as(transactions::Column::TotalAmount.sum(), "revenue")
            .filter(transactions::Column::StoreId.eq(store.id))
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed))
            .filter(transactions::Column::CompletedAt.gte(start))
            .filter(transactions::Column::CompletedAt.lt(end))
            .into_model::<RevenueRow>()
            .one(self.pool.as_ref())
            .await?
            .and_then(|r| r.revenue)
            .unwrap_or(Decimal::ZERO);

        let cameras = cameras::Entity::find()
            .filter(cameras::Column::StoreId.eq(store.id))
            .filter(cameras::Column::IsActive.eq(true));
        let cameras_total = cameras.clone().count(self.pool.as_ref()).await?;
        let cameras_online = cameras
            .filter(cameras::Column::IsOnline.eq(true))
            .count(self.pool.as_ref())
            .await?;

        Ok(StoreStatus {
            store_id: store.id,
            is_open: store.is_open_at(Local::now().time()),
            store_name: store.name,
            active_sessions,
            today_revenue,
            cameras_online,
            cameras_total,
        })
    }

    pub async fn product_availability(
        &self,
        product_id: Uuid,
        store_id: Uuid,
    ) -> AppResult<ProductAvailability> {
        let row = inventory::Entity::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .filter(inventory::Column::StoreId.eq(store_id))
            .one(self.pool.as_ref())
            .await?;
        Ok(ProductAvailability::from_inventory(row.as_ref()))
    }
}

/// First active camera of the given kind in a store.
pub async fn first_camera<C: sea_orm::ConnectionTrait>(
    db: &C,
    store_id: Uuid,
    camera_type: CameraType,
) -> Result<Option<cameras::Model>, sea_orm::DbErr> {
    cameras::Entity::find()
        .filter(cameras::Column::StoreId.eq(store_id))
        .filter(cameras::Column::CameraType.eq(camera_type))
        .filter(cameras::Column::IsActive.eq(true))
        .order_by_asc(cameras::Column::CameraCode)
        .one(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;

    fn count_row(n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
        BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
    }

    fn product(name: &str, active: bool) -> products::Model {
        let now = Utc::now();
        products::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: name.to_lowercase(),
            description: None,
            category_id: Uuid::new_v4(),
            barcode: format!("{name}-barcode"),
            sku: format!("{name}-sku"),
            price: dec!(100),
            cost_price: None,
            vat_rate: dec!(16),
            brand: None,
            manufacturer: None,
            country_of_origin: "Kenya".into(),
            weight: None,
            dimensions: None,
            visual_signature: None,
            is_active: active,
            is_featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn stock(product_id: Uuid, quantity: i32) -> inventory::Model {
        let now = Utc::now();
        inventory::Model {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            product_id,
            quantity,
            reorder_level: 10,
            max_stock_level: 100,
            shelf_location: Some("B2".into()),
            aisle: Some("4".into()),
            is_available: true,
            last_restocked: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn store(opening: (u32, u32), closing: (u32, u32)) -> stores::Model {
        let now = Utc::now();
        stores::Model {
            id: Uuid::new_v4(),
            name: "Westlands".into(),
            store_code: "NBO-001".into(),
            store_type: crate::entities::StoreType::Unmanned,
            county_id: 47,
            address: "Waiyaki Way".into(),
            latitude: None,
            longitude: None,
            phone_number: "+254712345678".into(),
            email: None,
            opening_time: NaiveTime::from_hms_opt(opening.0, opening.1, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(closing.0, closing.1, 0).unwrap(),
            is_24_hours: false,
            is_active: true,
            date_opened: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            manager_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn retired_products_are_dropped_from_store_lines() {
        let milk = product("Milk", true);
        let old = product("Old", false);
        let rows = vec![stock(milk.id, 5), stock(old.id, 40)];
        let lines = pair_with_products(rows.clone(), vec![milk.clone(), old.clone()], true);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product.id, milk.id);
        assert!(lines[0].needs_reorder);

        let all = pair_with_products(rows, vec![milk, old], false);
        assert_eq!(all.len(), 2);
        assert!(!all[1].needs_reorder);
    }

    #[test]
    fn trading_hours_handle_overnight_stores() {
        let day = store((7, 0), (22, 0));
        assert!(day.is_open_at(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
        assert!(!day.is_open_at(NaiveTime::from_hms_opt(22, 0, 0).unwrap()));

        let night = store((18, 0), (2, 0));
        assert!(night.is_open_at(NaiveTime::from_hms_opt(23, 30, 0).unwrap()));
        assert!(night.is_open_at(NaiveTime::from_hms_opt(1, 0, 0).unwrap()));
        assert!(!night.is_open_at(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));

        let mut closed = store((0, 0), (0, 0));
        closed.is_24_hours = true;
        assert!(closed.is_open_at(NaiveTime::from_hms_opt(3, 0, 0).unwrap()));
        closed.is_active = false;
        assert!(!closed.is_open_at(NaiveTime::from_hms_opt(3, 0, 0).unwrap()));
    }

    #[test]
    fn missing_inventory_means_unavailable() {
        assert_eq!(
            ProductAvailability::from_inventory(None),
            ProductAvailability {
                available: false,
                quantity: 0,
                location: None,
                aisle: None,
            }
        );
    }

    #[actix_web::test]
    async fn home_stats_counts_active_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(3)]])
            .append_query_results([[count_row(120)]])
            .append_query_results([[count_row(2)]])
            .into_connection();
        let stats = CatalogService::new(Arc::new(db)).home_stats().await.unwrap();
        assert_eq!(stats.total_stores, 3);
        assert_eq!(stats.total_products, 120);
        assert_eq!(stats.active_sessions, 2);
    }

    #[actix_web::test]
    async fn inactive_store_detail_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<stores::Model>::new()])
            .into_connection();
        assert!(matches!(
            CatalogService::new(Arc::new(db)).store_detail(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
