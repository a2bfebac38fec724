use crate::entities::{
    AlertSeverity, AlertType, AuditAction, CameraType, RecognitionResult, RecognitionType,
    SessionStatus, cart_item_entity as cart, facial_data_entity as facial_data,
    payment_account_entity as accounts, product_entity as products,
    shopping_session_entity as sessions, store_entity as stores,
    store_inventory_entity as inventory,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::audit_service::{self, AuditEntry};
use crate::services::behavior_service;
use crate::services::catalog_service::first_camera;
use crate::services::pricing::{CartTotals, LineTotals};
use crate::services::security_service::{self, NewAlert, RecognitionEntry};
use crate::utils::{RequestContext, SESSION_PREFIX, generate_reference_code};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Mock entry-camera score, 97.50.
pub const ENTRY_FACE_CONFIDENCE: Decimal = Decimal::from_parts(9750, 0, 0, false, 2);
const ENTRY_PROCESSING_MS: i32 = 150;

/// Outcome of asking to enter a store.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStart {
    Started(sessions::Model),
    /// The customer is already shopping; only one ACTIVE session is allowed.
    Existing(sessions::Model),
}

/// Loads a session the user owns, optionally requiring it to be ACTIVE.
pub async fn find_owned_session<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    session_id: Uuid,
    require_active: bool,
) -> AppResult<sessions::Model> {
    let mut select = sessions::Entity::find_by_id(session_id)
        .filter(sessions::Column::UserId.eq(user_id));
    if require_active {
        select = select.filter(sessions::Column::Status.eq(SessionStatus::Active));
    }
    select
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Shopping session not found".to_string()))
}

/// Cart lines of a session with their products and per-line totals.
pub async fn load_cart<C: ConnectionTrait>(
    db: &C,
    session_id: Uuid,
) -> AppResult<Vec<CartLineView>> {
    let items = cart::Entity::find()
        .filter(cart::Column::SessionId.eq(session_id))
        .order_by_asc(cart::Column::AddedAt)
        .all(db)
        .await?;
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let by_id: HashMap<Uuid, products::Model> = products::Entity::find()
        .filter(products::Column::Id.is_in(product_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    items
        .into_iter()
        .map(|item| {
            let product = by_id.get(&item.product_id).cloned().ok_or_else(|| {
                AppError::InternalError(format!("Cart item {} has no product", item.id))
            })?;
            Ok(CartLineView {
                totals: LineTotals::compute(item.unit_price, item.quantity, product.vat_rate),
                item,
                product,
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct SessionService {
    pool: Arc<DatabaseConnection>,
}

impl SessionService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    async fn active_session_of(&self, user_id: Uuid) -> AppResult<Option<sessions::Model>> {
        Ok(sessions::Entity::find()
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::Status.eq(SessionStatus::Active))
            .one(self.pool.as_ref())
            .await?)
    }

    pub async fn start(
        &self,
        user_id: Uuid,
        store_id: Uuid,
        ctx: &RequestContext,
    ) -> AppResult<SessionStart> {
        let store = stores::Entity::find_by_id(store_id)
            .filter(stores::Column::IsActive.eq(true))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

        let face = facial_data::Entity::find()
            .filter(facial_data::Column::UserId.eq(user_id))
            .filter(facial_data::Column::IsActive.eq(true))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::ValidationError("Please register your face first".to_string())
            })?;

        if face.is_locked {
            let camera = first_camera(self.pool.as_ref(), store.id, CameraType::Entry).await?;
            let mut entry = RecognitionEntry::new(
                store.id,
                RecognitionType::Entry,
                RecognitionResult::Blocked,
                Decimal::ZERO,
            );
            entry.user_id = Some(user_id);
            entry.camera_id = camera.map(|c| c.id);
            entry.error_message = Some("Face profile locked".to_string());
            security_service::log_recognition(self.pool.as_ref(), entry).await?;
            security_service::raise_alert(
                self.pool.as_ref(),
                NewAlert {
                    alert_type: AlertType::MultipleFail,
                    severity: AlertSeverity::High,
                    store_id: store.id,
                    user_id: Some(user_id),
                    session_id: None,
                    transaction_id: None,
                    description: format!(
                        "Locked face profile attempted entry at {}",
                        store.name
                    ),
                },
            )
            .await?;
            return Err(AppError::ValidationError(
                "Your face profile is locked. Please re-register your face".to_string(),
            ));
        }

        if let Some(existing) = self.active_session_of(user_id).await? {
            return Ok(SessionStart::Existing(existing));
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let camera = first_camera(&txn, store.id, CameraType::Entry).await?;
        let camera_id = camera.map(|c| c.id);

        let inserted = sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_code: Set(generate_reference_code(SESSION_PREFIX, now)),
            user_id: Set(user_id),
            store_id: Set(store.id),
            entry_time: Set(now),
            exit_time: Set(None),
            entry_camera_id: Set(camera_id),
            entry_face_confidence: Set(ENTRY_FACE_CONFIDENCE),
            status: Set(SessionStatus::Active),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await;

        let session = match inserted {
            Ok(session) => session,
            // Lost a race against another entry; the partial unique index on
            // ACTIVE sessions rejected the second row.
            Err(err) => match AppError::from_unique_violation(
                err,
                "You already have an active shopping session",
            ) {
                AppError::Conflict(message) => {
                    txn.rollback().await?;
                    return match self.active_session_of(user_id).await? {
                        Some(existing) => Ok(SessionStart::Existing(existing)),
                        None => Err(AppError::Conflict(message)),
                    };
                }
                other => return Err(other),
            },
        };

        let mut entry = RecognitionEntry::new(
            store.id,
            RecognitionType::Entry,
            RecognitionResult::Success,
            ENTRY_FACE_CONFIDENCE,
        );
        entry.user_id = Some(user_id);
        entry.camera_id = camera_id;
        entry.session_id = Some(session.id);
        entry.processing_time_ms = Some(ENTRY_PROCESSING_MS);
        security_service::log_recognition(&txn, entry).await?;

        let mut face = face.into_active_model();
        face.last_recognition_attempt = Set(Some(now));
        face.update(&txn).await?;

        behavior_service::record_visit(&txn, user_id, now).await?;

        audit_service::record(
            &txn,
            AuditEntry::new(Some(user_id), AuditAction::Create, "ShoppingSession")
                .object(session.id)
                .changes(json!({ "store_id": store.id })),
            ctx,
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "Session {} started for user {user_id} at {}",
            session.session_code,
            store.name
        );
        Ok(SessionStart::Started(session))
    }

    pub async fn view(&self, user_id: Uuid, session_id: Uuid) -> AppResult<SessionView> {
        let session = find_owned_session(self.pool.as_ref(), user_id, session_id, false).await?;
        let store = stores::Entity::find_by_id(session.store_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;
        let cart = load_cart(self.pool.as_ref(), session.id).await?;
        let totals = CartTotals::from_lines(cart.iter().map(|line| &line.totals));
        let payment_accounts = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::IsActive.eq(true))
            .order_by_desc(accounts::Column::IsPrimary)
            .all(self.pool.as_ref())
            .await?;

        Ok(SessionView {
            session,
            store,
            cart,
            totals,
            payment_accounts,
        })
    }

    /// Adds `quantity` (default 1) of a product to the cart, merging with an
    /// existing line. The line keeps the price from when it was first added.
    pub async fn add_to_cart(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        request: AddToCartRequest,
    ) -> AppResult<cart::Model> {
        let quantity = request.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(AppError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let session = find_owned_session(self.pool.as_ref(), user_id, session_id, true).await?;
        let product = products::Entity::find_by_id(request.product_id)
            .filter(products::Column::IsActive.eq(true))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        let stocked = inventory::Entity::find()
            .filter(inventory::Column::StoreId.eq(session.store_id))
            .filter(inventory::Column::ProductId.eq(product.id))
            .one(self.pool.as_ref())
            .await?
            .is_some_and(|row| row.in_stock());
        if !stocked {
            return Err(AppError::ValidationError(
                "Product not available in this store".to_string(),
            ));
        }

        let now = Utc::now();
        let row = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session.id),
            product_id: Set(product.id),
            quantity: Set(quantity),
            unit_price: Set(product.price),
            detected_by_camera_id: Set(None),
            detection_confidence: Set(None),
            added_at: Set(now),
            updated_at: Set(now),
        };
        cart::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([cart::Column::SessionId, cart::Column::ProductId])
                    .value(
                        cart::Column::Quantity,
                        Expr::col((cart::Entity, cart::Column::Quantity)).add(quantity),
                    )
                    .update_column(cart::Column::UpdatedAt)
                    .to_owned(),
            )
            .exec_without_returning(self.pool.as_ref())
            .await?;

        let line = cart::Entity::find()
            .filter(cart::Column::SessionId.eq(session.id))
            .filter(cart::Column::ProductId.eq(product.id))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::InternalError("Cart line vanished".to_string()))?;

        log::debug!("{} x{quantity} added to session {}", product.name, session.id);
        Ok(line)
    }

    async fn owned_cart_item(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<cart::Model> {
        let session = find_owned_session(self.pool.as_ref(), user_id, session_id, true).await?;
        cart::Entity::find_by_id(item_id)
            .filter(cart::Column::SessionId.eq(session.id))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))
    }

    /// Sets a line's quantity. Returns `None` when a non-positive quantity
    /// removed the line.
    pub async fn update_cart_item(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> AppResult<Option<cart::Model>> {
        let item = self.owned_cart_item(user_id, session_id, item_id).await?;
        if quantity <= 0 {
            item.delete(self.pool.as_ref()).await?;
            return Ok(None);
        }
        let mut am = item.into_active_model();
        am.quantity = Set(quantity);
        am.updated_at = Set(Utc::now());
        Ok(Some(am.update(self.pool.as_ref()).await?))
    }

    pub async fn remove_cart_item(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<()> {
        let item = self.owned_cart_item(user_id, session_id, item_id).await?;
        item.delete(self.pool.as_ref()).await?;
        Ok(())
    }

    /// Walks out without paying. The cart is left as it was.
    pub async fn cancel(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        ctx: &RequestContext,
    ) -> AppResult<sessions::Model> {
        let session = find_owned_session(self.pool.as_ref(), user_id, session_id, true).await?;
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        let mut am = session.into_active_model();
        am.status = Set(SessionStatus::Cancelled);
        am.exit_time = Set(Some(now));
        am.updated_at = Set(now);
        let session = am.update(&txn).await?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(user_id), AuditAction::Update, "ShoppingSession")
                .object(session.id)
                .changes(json!({ "status": [SessionStatus::Active, SessionStatus::Cancelled] })),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mock::{exec_ok, transaction_log};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn session(user_id: Uuid, status: SessionStatus) -> sessions::Model {
        let now = Utc::now();
        sessions::Model {
            id: Uuid::new_v4(),
            session_code: "SHOP-20250309-1A2B3C4D".into(),
            user_id,
            store_id: Uuid::new_v4(),
            entry_time: now,
            exit_time: None,
            entry_camera_id: None,
            entry_face_confidence: dec!(97.50),
            status,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn store() -> stores::Model {
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
            opening_time: chrono::NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            closing_time: chrono::NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            is_24_hours: false,
            is_active: true,
            date_opened: now.date_naive(),
            manager_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn face(user_id: Uuid, locked: bool) -> facial_data::Model {
        let now = Utc::now();
        facial_data::Model {
            id: Uuid::new_v4(),
            user_id,
            face_encoding: "aGVsbG8=".into(),
            registration_date: now,
            last_updated: now,
            is_active: true,
            confidence_threshold: dec!(95),
            failed_recognition_attempts: if locked { 5 } else { 0 },
            last_recognition_attempt: None,
            is_locked: locked,
        }
    }

    fn product() -> products::Model {
        let now = Utc::now();
        products::Model {
            id: Uuid::new_v4(),
            name: "Brookside Milk 500ml".into(),
            slug: "brookside-milk-500ml".into(),
            description: None,
            category_id: Uuid::new_v4(),
            barcode: "6161100230018".into(),
            sku: "DAI-0001".into(),
            price: dec!(65.00),
            cost_price: None,
            vat_rate: dec!(16.00),
            brand: Some("Brookside".into()),
            manufacturer: None,
            country_of_origin: "Kenya".into(),
            weight: None,
            dimensions: None,
            visual_signature: None,
            is_active: true,
            is_featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn shelf(store_id: Uuid, product_id: Uuid, quantity: i32) -> inventory::Model {
        let now = Utc::now();
        inventory::Model {
            id: Uuid::new_v4(),
            store_id,
            product_id,
            quantity,
            reorder_level: 10,
            max_stock_level: 100,
            shelf_location: None,
            aisle: Some("A3".into()),
            is_available: true,
            last_restocked: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(session_id: Uuid, product_id: Uuid, quantity: i32) -> cart::Model {
        let now = Utc::now();
        cart::Model {
            id: Uuid::new_v4(),
            session_id,
            product_id,
            quantity,
            unit_price: dec!(65.00),
            detected_by_camera_id: None,
            detection_confidence: None,
            added_at: now,
            updated_at: now,
        }
    }

    #[actix_web::test]
    async fn entering_without_a_face_profile_is_refused() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![store()]])
            .append_query_results([Vec::<facial_data::Model>::new()])
            .into_connection();
        match SessionService::new(Arc::new(db))
            .start(Uuid::new_v4(), Uuid::new_v4(), &RequestContext::default())
            .await
        {
            Err(AppError::ValidationError(msg)) => {
                assert_eq!(msg, "Please register your face first")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[actix_web::test]
    async fn an_active_session_is_returned_instead_of_a_second_one() {
        let user_id = Uuid::new_v4();
        let active = session(user_id, SessionStatus::Active);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![store()]])
            .append_query_results([vec![face(user_id, false)]])
            .append_query_results([vec![active.clone()]])
            .into_connection();
        let outcome = SessionService::new(Arc::new(db))
            .start(user_id, Uuid::new_v4(), &RequestContext::default())
            .await
            .unwrap();
        assert_eq!(outcome, SessionStart::Existing(active));
    }

    #[actix_web::test]
    async fn locked_face_is_blocked_and_raises_an_alert() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![store()]])
            .append_query_results([vec![face(user_id, true)]])
            .append_query_results([Vec::<crate::entities::camera_entity::Model>::new()])
            .append_exec_results([exec_ok(), exec_ok()])
            .into_connection();
        let db = Arc::new(db);
        let result = SessionService::new(db.clone())
            .start(user_id, Uuid::new_v4(), &RequestContext::default())
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));

        let log = transaction_log(db);
        assert!(log.contains("face_recognition_logs"));
        assert!(log.contains("BLOCKED"));
        assert!(log.contains("security_alerts"));
        assert!(log.contains("MULTIPLE_FAIL"));
    }

    #[actix_web::test]
    async fn zero_quantity_is_rejected_before_any_lookup() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = SessionService::new(Arc::new(db))
            .add_to_cart(
                Uuid::new_v4(),
                Uuid::new_v4(),
                AddToCartRequest {
                    product_id: Uuid::new_v4(),
                    quantity: Some(0),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[actix_web::test]
    async fn closed_session_does_not_accept_items() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<sessions::Model>::new()])
            .into_connection();
        let err = SessionService::new(Arc::new(db))
            .add_to_cart(
                Uuid::new_v4(),
                Uuid::new_v4(),
                AddToCartRequest {
                    product_id: Uuid::new_v4(),
                    quantity: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn adding_a_product_already_in_the_cart_merges_the_line() {
        let user_id = Uuid::new_v4();
        let active = session(user_id, SessionStatus::Active);
        let milk = product();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![active.clone()]])
                .append_query_results([vec![milk.clone()]])
                .append_query_results([vec![shelf(active.store_id, milk.id, 40)]])
                .append_exec_results([exec_ok()])
                .append_query_results([vec![line(active.id, milk.id, 3)]])
                .into_connection(),
        );

        let merged = SessionService::new(db.clone())
            .add_to_cart(
                user_id,
                active.id,
                AddToCartRequest {
                    product_id: milk.id,
                    quantity: Some(2),
                },
            )
            .await
            .unwrap();
        assert_eq!(merged.quantity, 3);

        let log = transaction_log(db);
        assert!(log.contains(r#"INSERT INTO "shopping_cart""#));
        assert!(log.contains("ON CONFLICT"));
        assert!(log.contains("DO UPDATE"));
    }

    #[actix_web::test]
    async fn product_missing_from_the_store_shelf_is_refused() {
        let user_id = Uuid::new_v4();
        let active = session(user_id, SessionStatus::Active);
        let milk = product();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![active.clone()]])
            .append_query_results([vec![milk.clone()]])
            .append_query_results([Vec::<inventory::Model>::new()])
            .into_connection();

        match SessionService::new(Arc::new(db))
            .add_to_cart(
                user_id,
                active.id,
                AddToCartRequest {
                    product_id: milk.id,
                    quantity: None,
                },
            )
            .await
        {
            Err(AppError::ValidationError(msg)) => {
                assert_eq!(msg, "Product not available in this store")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[actix_web::test]
    async fn zero_quantity_update_removes_the_line() {
        let user_id = Uuid::new_v4();
        let active = session(user_id, SessionStatus::Active);
        let item = line(active.id, Uuid::new_v4(), 2);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![active.clone()]])
                .append_query_results([vec![item.clone()]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );

        let updated = SessionService::new(db.clone())
            .update_cart_item(user_id, active.id, item.id, 0)
            .await
            .unwrap();
        assert!(updated.is_none());

        let log = transaction_log(db);
        assert!(log.contains(r#"DELETE FROM "shopping_cart""#));
        assert!(!log.contains(r#"UPDATE "shopping_cart""#));
    }

    #[actix_web::test]
    async fn cancelling_closes_the_session_and_keeps_the_cart() {
        let user_id = Uuid::new_v4();
        let active = session(user_id, SessionStatus::Active);
        let mut cancelled = active.clone();
        cancelled.status = SessionStatus::Cancelled;
        cancelled.exit_time = Some(Utc::now());
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![active.clone()]])
                .append_query_results([vec![cancelled]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );

        let closed = SessionService::new(db.clone())
            .cancel(user_id, active.id, &RequestContext::default())
            .await
            .unwrap();
        assert_eq!(closed.status, SessionStatus::Cancelled);
        assert!(closed.exit_time.is_some());

        let log = transaction_log(db);
        assert!(log.contains(r#"UPDATE "shopping_sessions""#));
        assert!(log.contains("CANCELLED"));
        assert!(!log.contains("shopping_cart"));
    }
}
