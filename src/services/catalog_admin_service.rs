//! Back-office maintenance of the catalogue: counties, categories, stores,
//! cameras, products, shelf stock and promotions, plus staff role grants.
//! Every write is audited inside the same database transaction.

use crate::entities::{
    AuditAction, DiscountType, camera_entity as cameras, county_entity as counties,
    product_category_entity as categories, product_entity as products,
    promotion_entity as promotions, store_entity as stores, store_inventory_entity as inventory,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::audit_service::{self, AuditEntry};
use crate::utils::{RequestContext, local_today, normalize_kenyan_phone, slugify};
use chrono::{NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, EntityTrait, IntoActiveModel, Set,
    TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_CAMERA_PORT: i32 = 554;
pub const DEFAULT_VAT_RATE: i64 = 16;
pub const DEFAULT_REORDER_LEVEL: i32 = 10;
pub const DEFAULT_MAX_STOCK_LEVEL: i32 = 100;
const DEFAULT_COUNTRY: &str = "Kenya";

fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Blank optional text is stored as NULL.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn validate_pricing(price: Decimal, vat_rate: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::ValidationError(
            "Price must be greater than zero".to_string(),
        ));
    }
    if vat_rate < Decimal::ZERO || vat_rate > Decimal::ONE_HUNDRED {
        return Err(AppError::ValidationError(
            "VAT rate must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_stock_levels(quantity: i32, reorder_level: i32, max_stock_level: i32) -> AppResult<()> {
    if quantity < 0 {
        return Err(AppError::ValidationError(
            "Quantity cannot be negative".to_string(),
        ));
    }
    if reorder_level < 0 || max_stock_level < reorder_level {
        return Err(AppError::ValidationError(
            "Reorder level must be between 0 and the maximum stock level".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_discount(
    discount_type: DiscountType,
    value: Decimal,
    start: chrono::DateTime<Utc>,
    end: chrono::DateTime<Utc>,
) -> AppResult<()> {
    if value <= Decimal::ZERO {
        return Err(AppError::ValidationError(
            "Discount value must be greater than zero".to_string(),
        ));
    }
    if discount_type == DiscountType::Percentage && value > Decimal::ONE_HUNDRED {
        return Err(AppError::ValidationError(
            "A percentage discount cannot exceed 100".to_string(),
        ));
    }
    if end <= start {
        return Err(AppError::ValidationError(
            "Promotion must end after it starts".to_string(),
        ));
    }
    Ok(())
}

/// Trading hours for a new store. Round-the-clock stores may omit them.
pub fn trading_hours(
    is_24_hours: bool,
    opening: Option<NaiveTime>,
    closing: Option<NaiveTime>,
) -> AppResult<(NaiveTime, NaiveTime)> {
    match (opening, closing) {
        (Some(open), Some(close)) => Ok((open, close)),
        _ if is_24_hours => Ok((NaiveTime::MIN, NaiveTime::MIN)),
        _ => Err(AppError::ValidationError(
            "Opening and closing times are required".to_string(),
        )),
    }
}

#[derive(Clone)]
pub struct CatalogAdminService {
    pool: Arc<DatabaseConnection>,
}

impl CatalogAdminService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    async fn store(&self, store_id: Uuid) -> AppResult<stores::Model> {
        stores::Entity::find_by_id(store_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))
    }

    async fn category(&self, category_id: Uuid) -> AppResult<categories::Model> {
        categories::Entity::find_by_id(category_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    pub async fn create_county(
        &self,
        staff_id: Uuid,
        request: CreateCountyRequest,
        ctx: &RequestContext,
    ) -> AppResult<counties::Model> {
        let name = required(&request.name, "County name")?;
        let code = required(&request.code, "County code")?;

        let txn = self.pool.begin().await?;
        let county = counties::ActiveModel {
            id: NotSet,
            name: Set(name),
            code: Set(code),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "County already exists"))?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Create, "County").object(county.id),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(county)
    }

    pub async fn create_category(
        &self,
        staff_id: Uuid,
        request: CreateCategoryRequest,
        ctx: &RequestContext,
    ) -> AppResult<categories::Model> {
        let name = required(&request.name, "Category name")?;
        let slug = match optional(request.slug) {
            Some(slug) => slugify(&slug),
            None => slugify(&name),
        };
        if slug.is_empty() {
            return Err(AppError::ValidationError(
                "Category slug is required".to_string(),
            ));
        }
        if let Some(parent_id) = request.parent_id {
            self.category(parent_id).await?;
        }

        let txn = self.pool.begin().await?;
        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            slug: Set(slug),
            description: Set(optional(request.description)),
            parent_id: Set(request.parent_id),
            is_active: Set(true),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Category slug already exists"))?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Create, "ProductCategory")
                .object(category.id),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(category)
    }

    pub async fn update_category(
        &self,
        staff_id: Uuid,
        category_id: Uuid,
        request: UpdateCategoryRequest,
        ctx: &RequestContext,
    ) -> AppResult<categories::Model> {
        let category = self.category(category_id).await?;
        if let Some(parent_id) = request.parent_id {
            if parent_id == category.id {
                return Err(AppError::ValidationError(
                    "A category cannot be its own parent".to_string(),
                ));
            }
            self.category(parent_id).await?;
        }
        let changes = serde_json::to_value(&request)?;

        let mut am = category.into_active_model();
        if let Some(name) = request.name {
            am.name = Set(required(&name, "Category name")?);
        }
        if request.description.is_some() {
            am.description = Set(optional(request.description));
        }
        if let Some(parent_id) = request.parent_id {
            am.parent_id = Set(Some(parent_id));
        }
        if let Some(is_active) = request.is_active {
            am.is_active = Set(is_active);
        }

        let txn = self.pool.begin().await?;
        let category = am.update(&txn).await?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Update, "ProductCategory")
                .object(category.id)
                .changes(changes),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(category)
    }

    pub async fn create_store(
        &self,
        staff_id: Uuid,
        request: CreateStoreRequest,
        ctx: &RequestContext,
    ) -> AppResult<stores::Model> {
        let name = required(&request.name, "Store name")?;
        let store_code = required(&request.store_code, "Store code")?.to_uppercase();
        let address = required(&request.address, "Address")?;
        let phone_number = normalize_kenyan_phone(&request.phone_number)?;
        let (opening_time, closing_time) = trading_hours(
            request.is_24_hours,
            request.opening_time,
            request.closing_time,
        )?;
        counties::Entity::find_by_id(request.county_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("County not found".to_string()))?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let store = stores::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            store_code: Set(store_code),
            store_type: Set(request.store_type),
            county_id: Set(request.county_id),
            address: Set(address),
            latitude: Set(request.latitude),
            longitude: Set(request.longitude),
            phone_number: Set(phone_number),
            email: Set(optional(request.email)),
            opening_time: Set(opening_time),
            closing_time: Set(closing_time),
            is_24_hours: Set(request.is_24_hours),
            is_active: Set(true),
            date_opened: Set(request.date_opened.unwrap_or_else(local_today)),
            manager_id: Set(request.manager_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Store code already exists"))?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Create, "Store")
                .object(store.id)
                .changes(json!({ "store_code": store.store_code })),
            ctx,
        )
        .await?;
        txn.commit().await?;

        log::info!("Store {} ({}) opened by {staff_id}", store.name, store.store_code);
        Ok(store)
    }

    pub async fn update_store(
        &self,
        staff_id: Uuid,
        store_id: Uuid,
        request: UpdateStoreRequest,
        ctx: &RequestContext,
    ) -> AppResult<stores::Model> {
        let store = self.store(store_id).await?;
        let changes = serde_json::to_value(&request)?;

        let mut am = store.into_active_model();
        if let Some(name) = request.name {
            am.name = Set(required(&name, "Store name")?);
        }
        if let Some(store_type) = request.store_type {
            am.store_type = Set(store_type);
        }
        if let Some(address) = request.address {
            am.address = Set(required(&address, "Address")?);
        }
        if let Some(phone) = request.phone_number {
            am.phone_number = Set(normalize_kenyan_phone(&phone)?);
        }
        if request.email.is_some() {
            am.email = Set(optional(request.email));
        }
        if let Some(opening) = request.opening_time {
            am.opening_time = Set(opening);
        }
        if let Some(closing) = request.closing_time {
            am.closing_time = Set(closing);
        }
        if let Some(is_24_hours) = request.is_24_hours {
            am.is_24_hours = Set(is_24_hours);
        }
        if let Some(is_active) = request.is_active {
            am.is_active = Set(is_active);
        }
        if let Some(manager_id) = request.manager_id {
            am.manager_id = Set(Some(manager_id));
        }
        am.updated_at = Set(Utc::now());

        let txn = self.pool.begin().await?;
        let store = am.update(&txn).await?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Update, "Store")
                .object(store.id)
                .changes(changes),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(store)
    }

    pub async fn create_camera(
        &self,
        staff_id: Uuid,
        store_id: Uuid,
        request: CreateCameraRequest,
        ctx: &RequestContext,
    ) -> AppResult<cameras::Model> {
        let store = self.store(store_id).await?;
        let camera_code = required(&request.camera_code, "Camera code")?.to_uppercase();
        let ip_address = required(&request.ip_address, "IP address")?;
        let stream_url = required(&request.stream_url, "Stream URL")?;
        let location_description =
            required(&request.location_description, "Location description")?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let camera = cameras::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store.id),
            camera_code: Set(camera_code),
            camera_type: Set(request.camera_type),
            ip_address: Set(ip_address),
            port: Set(request.port.unwrap_or(DEFAULT_CAMERA_PORT)),
            stream_url: Set(stream_url),
            location_description: Set(location_description),
            zone: Set(optional(request.zone)),
            is_active: Set(true),
            is_online: Set(false),
            last_ping: Set(None),
            installation_date: Set(request.installation_date.unwrap_or_else(local_today)),
            last_maintenance: Set(None),
            next_maintenance: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Camera code already exists"))?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Create, "Camera")
                .object(camera.id)
                .changes(json!({ "store_id": store.id, "camera_type": camera.camera_type })),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(camera)
    }

    pub async fn update_camera(
        &self,
        staff_id: Uuid,
        camera_id: Uuid,
        request: UpdateCameraRequest,
        ctx: &RequestContext,
    ) -> AppResult<cameras::Model> {
        let camera = cameras::Entity::find_by_id(camera_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Camera not found".to_string()))?;
        let changes = serde_json::to_value(&request)?;
        let now = Utc::now();

        let mut am = camera.into_active_model();
        if let Some(ip_address) = request.ip_address {
            am.ip_address = Set(required(&ip_address, "IP address")?);
        }
        if let Some(port) = request.port {
            am.port = Set(port);
        }
        if let Some(stream_url) = request.stream_url {
            am.stream_url = Set(required(&stream_url, "Stream URL")?);
        }
        if let Some(location) = request.location_description {
            am.location_description = Set(required(&location, "Location description")?);
        }
        if request.zone.is_some() {
            am.zone = Set(optional(request.zone));
        }
        if let Some(is_active) = request.is_active {
            am.is_active = Set(is_active);
        }
        if let Some(is_online) = request.is_online {
            am.is_online = Set(is_online);
            if is_online {
                am.last_ping = Set(Some(now));
            }
        }
        if let Some(date) = request.last_maintenance {
            am.last_maintenance = Set(Some(date));
        }
        if let Some(date) = request.next_maintenance {
            am.next_maintenance = Set(Some(date));
        }
        am.updated_at = Set(now);

        let txn = self.pool.begin().await?;
        let camera = am.update(&txn).await?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Update, "Camera")
                .object(camera.id)
                .changes(changes),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(camera)
    }

    pub async fn create_product(
        &self,
        staff_id: Uuid,
        request: CreateProductRequest,
        ctx: &RequestContext,
    ) -> AppResult<products::Model> {
        let name = required(&request.name, "Product name")?;
        let barcode = required(&request.barcode, "Barcode")?;
        let sku = required(&request.sku, "SKU")?.to_uppercase();
        let vat_rate = request
            .vat_rate
            .unwrap_or_else(|| Decimal::from(DEFAULT_VAT_RATE));
        validate_pricing(request.price, vat_rate)?;
        if request.cost_price.is_some_and(|cost| cost < Decimal::ZERO) {
            return Err(AppError::ValidationError(
                "Cost price cannot be negative".to_string(),
            ));
        }
        self.category(request.category_id).await?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(slugify(&name)),
            name: Set(name),
            description: Set(optional(request.description)),
            category_id: Set(request.category_id),
            barcode: Set(barcode),
            sku: Set(sku),
            price: Set(request.price),
            cost_price: Set(request.cost_price),
            vat_rate: Set(vat_rate),
            brand: Set(optional(request.brand)),
            manufacturer: Set(optional(request.manufacturer)),
            country_of_origin: Set(optional(request.country_of_origin)
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())),
            weight: Set(request.weight),
            dimensions: Set(optional(request.dimensions)),
            visual_signature: Set(None),
            is_active: Set(true),
            is_featured: Set(request.is_featured),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(
                e,
                "A product with this name, barcode or SKU already exists",
            )
        })?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Create, "Product")
                .object(product.id)
                .changes(json!({ "sku": product.sku, "price": product.price })),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        staff_id: Uuid,
        product_id: Uuid,
        request: UpdateProductRequest,
        ctx: &RequestContext,
    ) -> AppResult<products::Model> {
        let product = products::Entity::find_by_id(product_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
        validate_pricing(
            request.price.unwrap_or(product.price),
            request.vat_rate.unwrap_or(product.vat_rate),
        )?;
        if let Some(category_id) = request.category_id {
            self.category(category_id).await?;
        }
        let changes = serde_json::to_value(&request)?;

        let mut am = product.into_active_model();
        if let Some(name) = request.name {
            am.name = Set(required(&name, "Product name")?);
        }
        if request.description.is_some() {
            am.description = Set(optional(request.description));
        }
        if let Some(category_id) = request.category_id {
            am.category_id = Set(category_id);
        }
        if let Some(price) = request.price {
            am.price = Set(price);
        }
        if let Some(cost) = request.cost_price {
            am.cost_price = Set(Some(cost));
        }
        if let Some(vat_rate) = request.vat_rate {
            am.vat_rate = Set(vat_rate);
        }
        if request.brand.is_some() {
            am.brand = Set(optional(request.brand));
        }
        if let Some(is_active) = request.is_active {
            am.is_active = Set(is_active);
        }
        if let Some(is_featured) = request.is_featured {
            am.is_featured = Set(is_featured);
        }
        am.updated_at = Set(Utc::now());

        let txn = self.pool.begin().await?;
        let product = am.update(&txn).await?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Update, "Product")
                .object(product.id)
                .changes(changes),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(product)
    }

    /// Puts a product on a store's shelves.
    pub async fn create_inventory(
        &self,
        staff_id: Uuid,
        store_id: Uuid,
        request: CreateInventoryRequest,
        ctx: &RequestContext,
    ) -> AppResult<inventory::Model> {
        let reorder_level = request.reorder_level.unwrap_or(DEFAULT_REORDER_LEVEL);
        let max_stock_level = request.max_stock_level.unwrap_or(DEFAULT_MAX_STOCK_LEVEL);
        validate_stock_levels(request.quantity, reorder_level, max_stock_level)?;
        let store = self.store(store_id).await?;
        let product = products::Entity::find_by_id(request.product_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let row = inventory::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store.id),
            product_id: Set(product.id),
            quantity: Set(request.quantity),
            reorder_level: Set(reorder_level),
            max_stock_level: Set(max_stock_level),
            shelf_location: Set(optional(request.shelf_location)),
            aisle: Set(optional(request.aisle)),
            is_available: Set(true),
            last_restocked: Set((request.quantity > 0).then_some(now)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "Product is already stocked in this store")
        })?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Create, "StoreInventory")
                .object(row.id)
                .changes(json!({ "product": product.name, "quantity": row.quantity })),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(row)
    }

    pub async fn create_promotion(
        &self,
        staff_id: Uuid,
        request: CreatePromotionRequest,
        ctx: &RequestContext,
    ) -> AppResult<promotions::Model> {
        let name = required(&request.name, "Promotion name")?;
        let code = required(&request.code, "Promotion code")?.to_uppercase();
        let description = required(&request.description, "Description")?;
        validate_discount(
            request.discount_type,
            request.discount_value,
            request.start_date,
            request.end_date,
        )?;
        let minimum_purchase = request.minimum_purchase.unwrap_or(Decimal::ZERO);
        if minimum_purchase < Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Minimum purchase cannot be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let promotion = promotions::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            code: Set(code),
            description: Set(description),
            discount_type: Set(request.discount_type),
            discount_value: Set(request.discount_value),
            minimum_purchase: Set(minimum_purchase),
            maximum_discount: Set(request.maximum_discount),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            is_active: Set(true),
            usage_limit: Set(request.usage_limit),
            usage_per_customer: Set(request.usage_per_customer.unwrap_or(1)),
            times_used: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Promotion code already exists"))?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Create, "Promotion")
                .object(promotion.id)
                .changes(json!({ "code": promotion.code })),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(promotion)
    }

    pub async fn update_promotion(
        &self,
        staff_id: Uuid,
        promotion_id: Uuid,
        request: UpdatePromotionRequest,
        ctx: &RequestContext,
    ) -> AppResult<promotions::Model> {
        let promotion = promotions::Entity::find_by_id(promotion_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Promotion not found".to_string()))?;
        validate_discount(
            promotion.discount_type,
            request.discount_value.unwrap_or(promotion.discount_value),
            request.start_date.unwrap_or(promotion.start_date),
            request.end_date.unwrap_or(promotion.end_date),
        )?;
        let changes = serde_json::to_value(&request)?;

        let mut am = promotion.into_active_model();
        if let Some(name) = request.name {
            am.name = Set(required(&name, "Promotion name")?);
        }
        if let Some(description) = request.description {
            am.description = Set(required(&description, "Description")?);
        }
        if let Some(value) = request.discount_value {
            am.discount_value = Set(value);
        }
        if let Some(cap) = request.maximum_discount {
            am.maximum_discount = Set(Some(cap));
        }
        if let Some(start) = request.start_date {
            am.start_date = Set(start);
        }
        if let Some(end) = request.end_date {
            am.end_date = Set(end);
        }
        if let Some(is_active) = request.is_active {
            am.is_active = Set(is_active);
        }
        if let Some(limit) = request.usage_limit {
            am.usage_limit = Set(Some(limit));
        }
        am.updated_at = Set(Utc::now());

        let txn = self.pool.begin().await?;
        let promotion = am.update(&txn).await?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Update, "Promotion")
                .object(promotion.id)
                .changes(changes),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(promotion)
    }

    /// Grants or revokes staff access. Only superusers may do this, and never
    /// on their own account.
    pub async fn set_staff_role(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        request: UpdateStaffRoleRequest,
        ctx: &RequestContext,
    ) -> AppResult<UserResponse> {
        let actor = users::Entity::find_by_id(actor_id)
            .one(self.pool.as_ref())
            .await?;
        if !actor.is_some_and(|actor| actor.is_superuser && actor.is_active) {
            return Err(AppError::PermissionDenied);
        }
        if actor_id == user_id {
            return Err(AppError::ValidationError(
                "You cannot change your own role".to_string(),
            ));
        }
        let user = users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if user.is_superuser && !request.is_staff {
            return Err(AppError::ValidationError(
                "Superusers always keep staff access".to_string(),
            ));
        }
        let previous = user.is_staff;

        let mut am = user.into_active_model();
        am.is_staff = Set(request.is_staff);
        am.updated_at = Set(Utc::now());

        let txn = self.pool.begin().await?;
        let user = am.update(&txn).await?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(actor_id), AuditAction::Update, "CustomUser")
                .object(user.id)
                .changes(json!({ "is_staff": [previous, user.is_staff] })),
            ctx,
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "User {} staff access set to {} by {actor_id}",
            user.username,
            user.is_staff
        );
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mock::{exec_ok, transaction_log};
    use crate::entities::CameraType;
    use chrono::{Duration, NaiveDate};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn camera(store_id: Uuid, is_online: bool) -> cameras::Model {
        let now = Utc::now();
        cameras::Model {
            id: Uuid::new_v4(),
            store_id,
            camera_code: "NBO-001-ENT-1".into(),
            camera_type: CameraType::Entry,
            ip_address: "10.20.0.11".into(),
            port: DEFAULT_CAMERA_PORT,
            stream_url: "rtsp://10.20.0.11:554/stream".into(),
            location_description: "Main door".into(),
            zone: None,
            is_active: true,
            is_online,
            last_ping: is_online.then_some(now),
            installation_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            last_maintenance: None,
            next_maintenance: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn user(is_staff: bool, is_superuser: bool) -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Uuid::new_v4(),
            username: "achieng".into(),
            email: "achieng@example.com".into(),
            phone_number: "+254722000111".into(),
            password_hash: "hash".into(),
            first_name: "Achieng".into(),
            last_name: "Otieno".into(),
            id_number: None,
            date_of_birth: None,
            gender: None,
            is_verified: false,
            kyc_verified: false,
            is_staff,
            is_superuser,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pricing_rules() {
        assert!(validate_pricing(dec!(65.00), dec!(16)).is_ok());
        assert!(validate_pricing(dec!(0), dec!(16)).is_err());
        assert!(validate_pricing(dec!(65.00), dec!(101)).is_err());
        assert!(validate_pricing(dec!(65.00), dec!(-1)).is_err());
    }

    #[test]
    fn stock_levels_must_be_ordered() {
        assert!(validate_stock_levels(0, 10, 100).is_ok());
        assert!(validate_stock_levels(-1, 10, 100).is_err());
        assert!(validate_stock_levels(5, 50, 20).is_err());
    }

    #[test]
    fn promotions_need_a_window_and_a_sane_value() {
        let start = Utc::now();
        let end = start + Duration::days(7);
        assert!(validate_discount(DiscountType::Percentage, dec!(10), start, end).is_ok());
        assert!(validate_discount(DiscountType::Percentage, dec!(120), start, end).is_err());
        assert!(validate_discount(DiscountType::Fixed, dec!(120), start, end).is_ok());
        assert!(validate_discount(DiscountType::Fixed, dec!(50), end, start).is_err());
        assert!(validate_discount(DiscountType::Fixed, dec!(0), start, end).is_err());
    }

    #[test]
    fn round_the_clock_stores_may_skip_hours() {
        assert_eq!(
            trading_hours(true, None, None).unwrap(),
            (NaiveTime::MIN, NaiveTime::MIN)
        );
        assert!(trading_hours(false, NaiveTime::from_hms_opt(7, 0, 0), None).is_err());
    }

    #[actix_web::test]
    async fn store_in_unknown_county_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<counties::Model>::new()])
            .into_connection();
        let err = CatalogAdminService::new(Arc::new(db))
            .create_store(
                Uuid::new_v4(),
                CreateStoreRequest {
                    name: "BiashAI Westlands".into(),
                    store_code: "nbo-001".into(),
                    store_type: crate::entities::StoreType::Unmanned,
                    county_id: 99,
                    address: "Waiyaki Way".into(),
                    latitude: None,
                    longitude: None,
                    phone_number: "0712345678".into(),
                    email: None,
                    opening_time: None,
                    closing_time: None,
                    is_24_hours: true,
                    date_opened: None,
                    manager_id: None,
                },
                &RequestContext::default(),
            )
            .await
            .unwrap_err();
        match err {
            AppError::NotFound(msg) => assert_eq!(msg, "County not found"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[actix_web::test]
    async fn marking_a_camera_online_stamps_the_ping_and_is_audited() {
        let offline = camera(Uuid::new_v4(), false);
        let online = camera(offline.store_id, true);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![offline.clone()]])
                .append_query_results([vec![online]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );

        let updated = CatalogAdminService::new(db.clone())
            .update_camera(
                Uuid::new_v4(),
                offline.id,
                UpdateCameraRequest {
                    is_online: Some(true),
                    ..Default::default()
                },
                &RequestContext::default(),
            )
            .await
            .unwrap();
        assert!(updated.is_online);
        assert!(updated.last_ping.is_some());

        let log = transaction_log(db);
        assert!(log.contains(r#"UPDATE "cameras""#));
        assert!(log.contains("last_ping"));
        assert!(log.contains("audit_logs"));
    }

    #[actix_web::test]
    async fn product_in_unknown_category_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<categories::Model>::new()])
            .into_connection();
        let err = CatalogAdminService::new(Arc::new(db))
            .create_product(
                Uuid::new_v4(),
                CreateProductRequest {
                    name: "Brookside Milk 500ml".into(),
                    description: None,
                    category_id: Uuid::new_v4(),
                    barcode: "6161100230018".into(),
                    sku: "dai-0001".into(),
                    price: dec!(65.00),
                    cost_price: None,
                    vat_rate: None,
                    brand: None,
                    manufacturer: None,
                    country_of_origin: None,
                    weight: None,
                    dimensions: None,
                    is_featured: false,
                },
                &RequestContext::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn negative_opening_stock_is_rejected_before_any_lookup() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = CatalogAdminService::new(Arc::new(db))
            .create_inventory(
                Uuid::new_v4(),
                Uuid::new_v4(),
                CreateInventoryRequest {
                    product_id: Uuid::new_v4(),
                    quantity: -3,
                    reorder_level: None,
                    max_stock_level: None,
                    shelf_location: None,
                    aisle: None,
                },
                &RequestContext::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[actix_web::test]
    async fn only_superusers_grant_staff_access() {
        let staff = user(true, false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![staff.clone()]])
            .into_connection();
        let err = CatalogAdminService::new(Arc::new(db))
            .set_staff_role(
                staff.id,
                Uuid::new_v4(),
                UpdateStaffRoleRequest { is_staff: true },
                &RequestContext::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));
    }

    #[actix_web::test]
    async fn superuser_grants_staff_access() {
        let admin = user(true, true);
        let customer = user(false, false);
        let mut promoted = customer.clone();
        promoted.is_staff = true;
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![admin.clone()]])
                .append_query_results([vec![customer.clone()]])
                .append_query_results([vec![promoted]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );

        let response = CatalogAdminService::new(db.clone())
            .set_staff_role(
                admin.id,
                customer.id,
                UpdateStaffRoleRequest { is_staff: true },
                &RequestContext::default(),
            )
            .await
            .unwrap();
        assert!(response.is_staff);

        let log = transaction_log(db);
        assert!(log.contains(r#"UPDATE "users""#));
        assert!(log.contains("audit_logs"));
    }
}
