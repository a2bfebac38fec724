use crate::entities::{
    AlertStatus, AuditAction, PaymentMethod, RecognitionResult, SessionStatus, TransactionStatus,
    daily_sales_report_entity as reports, face_recognition_log_entity as recognition_logs,
    product_entity as products, security_alert_entity as alerts,
    shopping_session_entity as sessions, store_entity as stores,
    store_inventory_entity as inventory, transaction_entity as transactions,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::audit_service::{self, AuditEntry};
use crate::services::catalog_service::pair_with_products;
use crate::utils::{RequestContext, any_icontains, local_day_bounds, local_today};
use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const STAFF_PAGE_SIZE: u64 = 50;
pub const ANALYTICS_DAYS: u64 = 30;
const DASHBOARD_RECENT: u64 = 10;
const DASHBOARD_ALERTS: u64 = 5;
const TOP_STORES: u64 = 5;

#[derive(Debug, FromQueryResult)]
struct RevenueRow {
    revenue: Option<Decimal>,
}

#[derive(Debug, FromQueryResult)]
struct StoreRevenueRow {
    store_id: Uuid,
    revenue: Option<Decimal>,
}

#[derive(Debug, FromQueryResult)]
struct DailyRevenueRow {
    report_date: NaiveDate,
    revenue: Option<Decimal>,
}

#[derive(Debug, FromQueryResult)]
struct PaymentMethodRow {
    payment_method: PaymentMethod,
    count: i64,
    total: Option<Decimal>,
}

#[derive(Debug, FromQueryResult)]
struct RecognitionRow {
    result: RecognitionResult,
    count: i64,
}

/// Inclusive date window ending today.
pub fn analytics_window(today: NaiveDate, days: u64) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_days(Days::new(days.saturating_sub(1)))
        .unwrap_or(today);
    (start, today)
}

#[derive(Clone)]
pub struct StaffService {
    pool: Arc<DatabaseConnection>,
}

impl StaffService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    pub async fn dashboard(&self) -> AppResult<StaffDashboard> {
        let (start, end) = local_day_bounds(local_today());
        let today = transactions::Entity::find()
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed))
            .filter(transactions::Column::CompletedAt.gte(start))
            .filter(transactions::Column::CompletedAt.lt(end));

        let today_count = today.clone().count(self.pool.as_ref()).await?;
        let today_revenue = today
            .select_only()
            .column_as(transactions::Column::TotalAmount.sum(), "revenue")
            .into_model::<RevenueRow>()
            .one(self.pool.as_ref())
            .await?
            .and_then(|r| r.revenue)
            .unwrap_or(Decimal::ZERO);

        let active_sessions = sessions::Entity::find()
            .filter(sessions::Column::Status.eq(SessionStatus::Active))
            .count(self.pool.as_ref())
            .await?;

        let recent_transactions = transactions::Entity::find()
            .order_by_desc(transactions::Column::InitiatedAt)
            .limit(DASHBOARD_RECENT)
            .all(self.pool.as_ref())
            .await?;

        let open_alerts = alerts::Entity::find()
            .filter(alerts::Column::Status.eq(AlertStatus::Open))
            .order_by_desc(alerts::Column::CreatedAt)
            .limit(DASHBOARD_ALERTS)
            .all(self.pool.as_ref())
            .await?;

        let top_rows = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::StoreId)
            .column_as(transactions::Column::TotalAmount.sum(), "revenue")
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed))
            .group_by(transactions::Column::StoreId)
            .order_by_desc(transactions::Column::TotalAmount.sum())
            .limit(TOP_STORES)
            .into_model::<StoreRevenueRow>()
            .all(self.pool.as_ref())
            .await?;
        let top_stores = self.name_stores(top_rows).await?;

        Ok(StaffDashboard {
            today_revenue,
            today_count,
            active_sessions,
            recent_transactions,
            open_alerts,
            top_stores,
        })
    }

    async fn name_stores(&self, rows: Vec<StoreRevenueRow>) -> AppResult<Vec<StoreRevenue>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let names: HashMap<Uuid, String> = stores::Entity::find()
            .filter(stores::Column::Id.is_in(rows.iter().map(|r| r.store_id)))
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        Ok(rows
            .into_iter()
            .map(|r| StoreRevenue {
                store_name: names.get(&r.store_id).cloned().unwrap_or_default(),
                store_id: r.store_id,
                revenue: r.revenue.unwrap_or(Decimal::ZERO),
            })
            .collect())
    }

    pub async fn analytics(&self) -> AppResult<Analytics> {
        let (start_date, end_date) = analytics_window(local_today(), ANALYTICS_DAYS);
        let (since, _) = local_day_bounds(start_date);
        let (_, until) = local_day_bounds(end_date);

        let daily_revenue = reports::Entity::find()
            .select_only()
            .column(reports::Column::ReportDate)
            .column_as(reports::Column::TotalRevenue.sum(), "revenue")
            .filter(reports::Column::ReportDate.gte(start_date))
            .filter(reports::Column::ReportDate.lte(end_date))
            .group_by(reports::Column::ReportDate)
            .order_by_asc(reports::Column::ReportDate)
            .into_model::<DailyRevenueRow>()
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|r| DailyRevenue {
                report_date: r.report_date,
                revenue: r.revenue.unwrap_or(Decimal::ZERO),
            })
            .collect();

        let payment_breakdown = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::PaymentMethod)
            .column_as(transactions::Column::Id.count(), "count")
            .column_as(transactions::Column::TotalAmount.sum(), "total")
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed))
            .filter(transactions::Column::CompletedAt.gte(since))
            .filter(transactions::Column::CompletedAt.lt(until))
            .group_by(transactions::Column::PaymentMethod)
            .into_model::<PaymentMethodRow>()
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|r| PaymentMethodBreakdown {
                payment_method: r.payment_method,
                count: r.count,
                total: r.total.unwrap_or(Decimal::ZERO),
            })
            .collect();

        let recognition_stats = recognition_logs::Entity::find()
            .select_only()
            .column(recognition_logs::Column::Result)
            .column_as(recognition_logs::Column::Id.count(), "count")
            .filter(recognition_logs::Column::Timestamp.gte(since))
            .filter(recognition_logs::Column::Timestamp.lt(until))
            .group_by(recognition_logs::Column::Result)
            .into_model::<RecognitionRow>()
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|r| RecognitionStat {
                result: r.result,
                count: r.count,
            })
            .collect();

        Ok(Analytics {
            start_date,
            end_date,
            daily_revenue,
            payment_breakdown,
            recognition_stats,
        })
    }

    /// Every store, including inactive ones.
    pub async fn stores(&self) -> AppResult<Vec<stores::Model>> {
        Ok(stores::Entity::find()
            .order_by_asc(stores::Column::Name)
            .all(self.pool.as_ref())
            .await?)
    }

    pub async fn products(
        &self,
        query: &ProductQuery,
    ) -> AppResult<PaginatedResponse<products::Model>> {
        let params = PaginationParams::with_page_size(query.page, STAFF_PAGE_SIZE);

        let mut select = products::Entity::find();
        if let Some(category) = query.category {
            select = select.filter(products::Column::CategoryId.eq(category));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(any_icontains(
                &[
                    products::Column::Name,
                    products::Column::Barcode,
                    products::Column::Sku,
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

    pub async fn inventory(&self, store_id: Uuid) -> AppResult<InventoryOverview> {
        let store = stores::Entity::find_by_id(store_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

        let rows = inventory::Entity::find()
            .filter(inventory::Column::StoreId.eq(store.id))
            .order_by_asc(inventory::Column::Aisle)
            .order_by_asc(inventory::Column::ShelfLocation)
            .all(self.pool.as_ref())
            .await?;
        let products = if rows.is_empty() {
            Vec::new()
        } else {
            products::Entity::find()
                .filter(products::Column::Id.is_in(rows.iter().map(|r| r.product_id)))
                .all(self.pool.as_ref())
                .await?
        };

        let inventory = pair_with_products(rows, products, false);
        let low_stock = inventory
            .iter()
            .filter(|line| line.needs_reorder)
            .cloned()
            .collect();
        Ok(InventoryOverview {
            store,
            inventory,
            low_stock,
        })
    }

    /// Sets a shelf count. Raising it counts as a restock.
    pub async fn update_inventory(
        &self,
        staff_id: Uuid,
        inventory_id: Uuid,
        request: UpdateInventoryRequest,
        ctx: &RequestContext,
    ) -> AppResult<inventory::Model> {
        if request.quantity < 0 {
            return Err(AppError::ValidationError(
                "Quantity cannot be negative".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;
        let row = inventory::Entity::find_by_id(inventory_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory record not found".to_string()))?;

        let previous = row.quantity;
        let now = Utc::now();
        let mut am = row.into_active_model();
        am.quantity = Set(request.quantity);
        if request.quantity > previous {
            am.last_restocked = Set(Some(now));
        }
        if let Some(available) = request.is_available {
            am.is_available = Set(available);
        }
        am.updated_at = Set(now);
        let updated = am.update(&txn).await?;

        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Update, "StoreInventory")
                .object(updated.id)
                .changes(json!({
                    "quantity": [previous, updated.quantity],
                    "reason": request.reason,
                })),
            ctx,
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "Inventory {} set from {previous} to {} by {staff_id}",
            updated.id,
            updated.quantity
        );
        Ok(updated)
    }

    /// Customers only; staff and superusers are left out.
    pub async fn customers(
        &self,
        query: &CustomerQuery,
    ) -> AppResult<PaginatedResponse<UserResponse>> {
        let params = PaginationParams::with_page_size(query.page, STAFF_PAGE_SIZE);

        let mut select = users::Entity::find()
            .filter(users::Column::IsStaff.eq(false))
            .filter(users::Column::IsSuperuser.eq(false));
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(any_icontains(
                &[
                    users::Column::Username,
                    users::Column::Email,
                    users::Column::PhoneNumber,
                    users::Column::FirstName,
                    users::Column::LastName,
                ],
                search,
            ));
        }

        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_desc(users::Column::CreatedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(self.pool.as_ref())
            .await?;
        Ok(PaginatedResponse::new(items, &params, total).map(UserResponse::from))
    }
}
