//! Checkout: turns an ACTIVE session's cart into a completed transaction.
//!
//! Everything below runs in one database transaction. Closing the session,
//! writing the ledger rows, decrementing stock, crediting loyalty points and
//! updating the behaviour profile either all land or none do.

use crate::entities::{
    AuditAction, CameraType, RecognitionResult, RecognitionType, SessionStatus,
    TransactionStatus, payment_account_entity as accounts, shopping_session_entity as sessions,
    store_entity as stores, store_inventory_entity as inventory,
    transaction_entity as transactions, transaction_item_entity as transaction_items,
};
use crate::error::{AppError, AppResult};
use crate::models::{CartLineView, CheckoutReceipt, CheckoutRequest};
use crate::services::audit_service::{self, AuditEntry};
use crate::services::behavior_service::{self, PurchaseFacts};
use crate::services::catalog_service::first_camera;
use crate::services::loyalty_service::{self, PointsMovement};
use crate::services::pricing::{CartTotals, points_for};
use crate::services::security_service::{self, RecognitionEntry};
use crate::services::session_service::{find_owned_session, load_cart};
use crate::utils::{
    RECEIPT_PREFIX, RequestContext, TRANSACTION_PREFIX, generate_provider_reference,
    generate_reference_code,
};
use chrono::{Days, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Mock checkout-camera score, 96.80.
pub const CHECKOUT_FACE_CONFIDENCE: Decimal = Decimal::from_parts(9680, 0, 0, false, 2);
const CHECKOUT_PROCESSING_MS: i32 = 180;

/// Categories in the basket, most units first.
pub fn basket_categories(cart: &[CartLineView]) -> Vec<Uuid> {
    let mut units: HashMap<Uuid, i32> = HashMap::new();
    let mut order: Vec<Uuid> = Vec::new();
    for line in cart {
        let category = line.product.category_id;
        if !units.contains_key(&category) {
            order.push(category);
        }
        *units.entry(category).or_default() += line.item.quantity;
    }
    // Stable sort keeps first-seen order among ties.
    order.sort_by_key(|c| std::cmp::Reverse(units[c]));
    order
}

fn item_row(transaction_id: Uuid, line: &CartLineView) -> transaction_items::Model {
    transaction_items::Model {
        id: Uuid::new_v4(),
        transaction_id,
        product_id: line.product.id,
        product_name: line.product.name.clone(),
        quantity: line.totals.quantity,
        unit_price: line.totals.unit_price,
        vat_rate: line.totals.vat_rate,
        subtotal: line.totals.subtotal,
        vat_amount: line.totals.vat_amount,
        total: line.totals.total,
        created_at: Utc::now(),
    }
}

async fn insert_item<C: ConnectionTrait>(
    db: &C,
    item: &transaction_items::Model,
) -> Result<(), DbErr> {
    let row = transaction_items::ActiveModel {
        id: Set(item.id),
        transaction_id: Set(item.transaction_id),
        product_id: Set(item.product_id),
        product_name: Set(item.product_name.clone()),
        quantity: Set(item.quantity),
        unit_price: Set(item.unit_price),
        vat_rate: Set(item.vat_rate),
        subtotal: Set(item.subtotal),
        vat_amount: Set(item.vat_amount),
        total: Set(item.total),
        created_at: Set(item.created_at),
    };
    transaction_items::Entity::insert(row)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Takes `quantity` units off the shelf. The filter keeps stock from going
/// negative; zero rows affected means there was not enough.
async fn take_stock<C: ConnectionTrait>(
    db: &C,
    store_id: Uuid,
    line: &CartLineView,
) -> AppResult<()> {
    let quantity = line.item.quantity;
    let result = inventory::Entity::update_many()
        .col_expr(
            inventory::Column::Quantity,
            Expr::col(inventory::Column::Quantity).sub(quantity),
        )
        .col_expr(inventory::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(inventory::Column::StoreId.eq(store_id))
        .filter(inventory::Column::ProductId.eq(line.product.id))
        .filter(inventory::Column::Quantity.gte(quantity))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::ValidationError(format!(
            "Insufficient stock for {}",
            line.product.name
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct CheckoutService {
    pool: Arc<DatabaseConnection>,
    points_expiry_days: u64,
}

impl CheckoutService {
    pub fn new(pool: Arc<DatabaseConnection>, points_expiry_days: i64) -> Self {
        Self {
            pool,
            points_expiry_days: points_expiry_days.max(0) as u64,
        }
    }

    pub async fn checkout(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        request: CheckoutRequest,
        ctx: &RequestContext,
    ) -> AppResult<CheckoutReceipt> {
        let txn = self.pool.begin().await?;

        let session = find_owned_session(&txn, user_id, session_id, true).await?;
        let cart = load_cart(&txn, session.id).await?;
        if cart.is_empty() {
            return Err(AppError::ValidationError("Your cart is empty".to_string()));
        }

        let account = accounts::Entity::find_by_id(request.payment_account_id)
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment account not found".to_string()))?;

        let totals = CartTotals::from_lines(cart.iter().map(|line| &line.totals));
        if totals.total > account.transaction_limit {
            return Err(AppError::ValidationError(format!(
                "Total {} exceeds the account's transaction limit of {}",
                totals.total, account.transaction_limit
            )));
        }

        let now = Utc::now();
        let closed = sessions::Entity::update_many()
            .col_expr(
                sessions::Column::Status,
                Expr::value(SessionStatus::Completed),
            )
            .col_expr(sessions::Column::ExitTime, Expr::value(Some(now)))
            .col_expr(sessions::Column::UpdatedAt, Expr::value(now))
            .filter(sessions::Column::Id.eq(session.id))
            .filter(sessions::Column::Status.eq(SessionStatus::Active))
            .exec(&txn)
            .await?;
        if closed.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Shopping session is no longer active".to_string(),
            ));
        }

        let camera_id = first_camera(&txn, session.store_id, CameraType::Checkout)
            .await?
            .map(|c| c.id);

        let transaction = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            transaction_code: Set(generate_reference_code(TRANSACTION_PREFIX, now)),
            session_id: Set(session.id),
            user_id: Set(user_id),
            store_id: Set(session.store_id),
            payment_account_id: Set(account.id),
            payment_method: Set(account.payment_method),
            subtotal: Set(totals.subtotal),
            vat_amount: Set(totals.vat_amount),
            discount_amount: Set(Decimal::ZERO),
            total_amount: Set(totals.total),
            provider_transaction_id: Set(None),
            provider_response: Set(None),
            checkout_camera_id: Set(camera_id),
            face_recognition_confidence: Set(CHECKOUT_FACE_CONFIDENCE),
            status: Set(TransactionStatus::Pending),
            initiated_at: Set(now),
            completed_at: Set(None),
            receipt_number: Set(Some(generate_reference_code(RECEIPT_PREFIX, now))),
            receipt_url: Set(None),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(cart.len());
        for line in &cart {
            let item = item_row(transaction.id, line);
            insert_item(&txn, &item).await?;
            take_stock(&txn, session.store_id, line).await?;
            items.push(item);
        }

        // Payment is mocked: the provider accepts immediately.
        let completed_at = Utc::now();
        let mut am = transaction.into_active_model();
        am.status = Set(TransactionStatus::Completed);
        am.completed_at = Set(Some(completed_at));
        am.provider_transaction_id = Set(Some(generate_provider_reference(
            &account.payment_method.to_string(),
        )));
        am.updated_at = Set(completed_at);
        let transaction = am.update(&txn).await?;

        let mut sighting = RecognitionEntry::new(
            session.store_id,
            RecognitionType::Checkout,
            RecognitionResult::Success,
            CHECKOUT_FACE_CONFIDENCE,
        );
        sighting.user_id = Some(user_id);
        sighting.camera_id = camera_id;
        sighting.session_id = Some(session.id);
        sighting.transaction_id = Some(transaction.id);
        sighting.processing_time_ms = Some(CHECKOUT_PROCESSING_MS);
        security_service::log_recognition(&txn, sighting).await?;

        let store_name = stores::Entity::find_by_id(session.store_id)
            .one(&txn)
            .await?
            .map(|s| s.name)
            .unwrap_or_default();
        let points = points_for(transaction.total_amount);
        let expires_at = completed_at
            .date_naive()
            .checked_add_days(Days::new(self.points_expiry_days));
        let (program, _) = loyalty_service::earn_points(
            &txn,
            user_id,
            PointsMovement {
                points,
                related_transaction_id: Some(transaction.id),
                description: format!("Earned from purchase at {store_name}"),
                expires_at,
            },
        )
        .await?;

        behavior_service::record_purchase(
            &txn,
            user_id,
            PurchaseFacts {
                total: transaction.total_amount,
                session_started: session.entry_time,
                completed_at,
                categories: basket_categories(&cart),
            },
        )
        .await?;

        audit_service::record(
            &txn,
            AuditEntry::new(Some(user_id), AuditAction::Payment, "Transaction")
                .object(transaction.id)
                .changes(json!({
                    "total_amount": transaction.total_amount,
                    "payment_method": transaction.payment_method,
                })),
            ctx,
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Checkout {} completed: {} for user {user_id}, {points} points",
            transaction.transaction_code,
            transaction.total_amount
        );
        Ok(CheckoutReceipt {
            transaction,
            items,
            points_earned: points,
            loyalty_balance: program.current_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        LoyaltyTier, PaymentMethod, camera_entity as cameras, cart_item_entity as cart_items,
        customer_behavior_entity as behavior, loyalty_program_entity as programs,
        product_entity as products,
    };
    use crate::services::pricing::LineTotals;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    fn session(user_id: Uuid, store_id: Uuid) -> sessions::Model {
        let now = Utc::now();
        sessions::Model {
            id: Uuid::new_v4(),
            session_code: "SHOP-20250309-1A2B3C4D".into(),
            user_id,
            store_id,
            entry_time: now - chrono::Duration::minutes(12),
            exit_time: None,
            entry_camera_id: None,
            entry_face_confidence: dec!(97.50),
            status: SessionStatus::Active,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn product(
        name: &str,
        price: Decimal,
        vat_rate: Decimal,
        category_id: Uuid,
    ) -> products::Model {
        let now = Utc::now();
        products::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: name.to_lowercase(),
            description: None,
            category_id,
            barcode: format!("{name}-bc"),
            sku: format!("{name}-sku"),
            price,
            cost_price: None,
            vat_rate,
            brand: None,
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

    fn cart_item(
        session_id: Uuid,
        product: &products::Model,
        quantity: i32,
    ) -> cart_items::Model {
        let now = Utc::now();
        cart_items::Model {
            id: Uuid::new_v4(),
            session_id,
            product_id: product.id,
            quantity,
            unit_price: product.price,
            detected_by_camera_id: None,
            detection_confidence: None,
            added_at: now,
            updated_at: now,
        }
    }

    fn account(user_id: Uuid, limit: Decimal) -> accounts::Model {
        let now = Utc::now();
        accounts::Model {
            id: Uuid::new_v4(),
            user_id,
            payment_method: PaymentMethod::Mpesa,
            account_number: "+254712345678".into(),
            account_name: "Wanjiku Kamau".into(),
            provider_reference: None,
            is_primary: true,
            is_verified: false,
            is_active: true,
            daily_limit: dec!(50000),
            transaction_limit: limit,
            created_at: now,
            updated_at: now,
        }
    }

    fn ledger_row(
        session: &sessions::Model,
        account: &accounts::Model,
        status: TransactionStatus,
        total: Decimal,
    ) -> transactions::Model {
        let now = Utc::now();
        transactions::Model {
            id: Uuid::new_v4(),
            transaction_code: "TXN-20250309-0A1B2C3D".into(),
            session_id: session.id,
            user_id: session.user_id,
            store_id: session.store_id,
            payment_account_id: account.id,
            payment_method: account.payment_method,
            subtotal: dec!(249.99),
            vat_amount: dec!(32.00),
            discount_amount: Decimal::ZERO,
            total_amount: total,
            provider_transaction_id: None,
            provider_response: None,
            checkout_camera_id: None,
            face_recognition_confidence: dec!(96.80),
            status,
            initiated_at: now,
            completed_at: None,
            receipt_number: Some("RCP-20250309-0A1B2C3D".into()),
            receipt_url: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn program(user_id: Uuid, earned: i32) -> programs::Model {
        let now = Utc::now();
        programs::Model {
            id: Uuid::new_v4(),
            user_id,
            total_points_earned: earned,
            total_points_redeemed: 0,
            current_balance: earned,
            current_tier: LoyaltyTier::Bronze,
            member_since: now.date_naive(),
            last_activity: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn profile(user_id: Uuid) -> behavior::Model {
        behavior::Model {
            id: Uuid::new_v4(),
            user_id,
            total_visits: 1,
            total_purchases: 0,
            total_spent: Decimal::ZERO,
            favorite_store_id: None,
            favorite_categories: serde_json::json!([]),
            preferred_shopping_time: None,
            average_session_duration: 0,
            last_visit: None,
            last_purchase: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn basket_categories_rank_by_units() {
        let produce = Uuid::new_v4();
        let dairy = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let lines: Vec<CartLineView> = [
            (product("Kale", dec!(30), dec!(0), produce), 1),
            (product("Milk", dec!(60), dec!(16), dairy), 2),
            (product("Onion", dec!(10), dec!(0), produce), 3),
        ]
        .into_iter()
        .map(|(p, q)| CartLineView {
            item: cart_item(session_id, &p, q),
            totals: LineTotals::compute(p.price, q, p.vat_rate),
            product: p,
        })
        .collect();
        assert_eq!(basket_categories(&lines), vec![produce, dairy]);
    }

    #[actix_web::test]
    async fn empty_cart_cannot_be_checked_out() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![session(user_id, Uuid::new_v4())]])
            .append_query_results([Vec::<cart_items::Model>::new()])
            .into_connection();
        let err = CheckoutService::new(Arc::new(db), 365)
            .checkout(
                user_id,
                Uuid::new_v4(),
                CheckoutRequest {
                    payment_account_id: Uuid::new_v4(),
                },
                &RequestContext::default(),
            )
            .await
            .unwrap_err();
        match err {
            AppError::ValidationError(msg) => assert_eq!(msg, "Your cart is empty"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[actix_web::test]
    async fn totals_over_the_account_limit_are_rejected() {
        let user_id = Uuid::new_v4();
        let shop = session(user_id, Uuid::new_v4());
        let tv = product("Television", dec!(45000), dec!(16), Uuid::new_v4());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![shop.clone()]])
            .append_query_results([vec![cart_item(shop.id, &tv, 1)]])
            .append_query_results([vec![tv]])
            .append_query_results([vec![account(user_id, dec!(10000))]])
            .into_connection();
        let err = CheckoutService::new(Arc::new(db), 365)
            .checkout(
                user_id,
                shop.id,
                CheckoutRequest {
                    payment_account_id: Uuid::new_v4(),
                },
                &RequestContext::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[actix_web::test]
    async fn checkout_is_refused_when_shelf_runs_out() {
        let user_id = Uuid::new_v4();
        let shop = session(user_id, Uuid::new_v4());
        let milk = product("Milk", dec!(60), dec!(16), Uuid::new_v4());
        let acct = account(user_id, dec!(10000));
        let pending = ledger_row(&shop, &acct, TransactionStatus::Pending, dec!(208.80));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![shop.clone()]])
            .append_query_results([vec![cart_item(shop.id, &milk, 3)]])
            .append_query_results([vec![milk]])
            .append_query_results([vec![acct]])
            .append_query_results([Vec::<cameras::Model>::new()])
            .append_query_results([vec![pending]])
            // session closed, item inserted, stock guard matched nothing
            .append_exec_results([exec(1), exec(1), exec(0)])
            .into_connection();

        let err = CheckoutService::new(Arc::new(db), 365)
            .checkout(
                user_id,
                shop.id,
                CheckoutRequest {
                    payment_account_id: Uuid::new_v4(),
                },
                &RequestContext::default(),
            )
            .await
            .unwrap_err();
        match err {
            AppError::ValidationError(msg) => assert_eq!(msg, "Insufficient stock for Milk"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[actix_web::test]
    async fn checkout_writes_ledger_and_credits_points() {
        let user_id = Uuid::new_v4();
        let store_id = Uuid::new_v4();
        let shop = session(user_id, store_id);
        let flour = product("Flour", dec!(100), dec!(16), Uuid::new_v4());
        let bread = product("Bread", dec!(49.99), dec!(0), Uuid::new_v4());
        let acct = account(user_id, dec!(10000));

        // 2 x 100 + 16% VAT = 232.00, 1 x 49.99 zero-rated = 49.99
        let expected_total = dec!(281.99);
        let pending = ledger_row(&shop, &acct, TransactionStatus::Pending, expected_total);
        let mut completed = pending.clone();
        completed.status = TransactionStatus::Completed;
        completed.completed_at = Some(Utc::now());

        let before = program(user_id, 100);
        let mut after = before.clone();
        after.total_points_earned = 381;
        after.current_balance = 381;

        let store = crate::entities::store_entity::Model {
            id: store_id,
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
            date_opened: Utc::now().date_naive(),
            manager_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let mut updated_profile = profile(user_id);
        updated_profile.total_purchases = 1;
        updated_profile.total_spent = expected_total;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![shop.clone()]])
            .append_query_results([vec![
                cart_item(shop.id, &flour, 2),
                cart_item(shop.id, &bread, 1),
            ]])
            .append_query_results([vec![flour.clone(), bread.clone()]])
            .append_query_results([vec![acct]])
            .append_query_results([Vec::<cameras::Model>::new()])
            .append_query_results([vec![pending]])
            .append_query_results([vec![completed]])
            .append_query_results([vec![store]])
            .append_query_results([vec![before]])
            .append_query_results([vec![after]])
            .append_query_results([vec![profile(user_id)]])
            .append_query_results([vec![updated_profile]])
            // session close, 2 x (item insert + stock), recognition, ledger entry, audit
            .append_exec_results([
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
            ])
            .into_connection();

        let receipt = CheckoutService::new(Arc::new(db), 365)
            .checkout(
                user_id,
                shop.id,
                CheckoutRequest {
                    payment_account_id: Uuid::new_v4(),
                },
                &RequestContext::default(),
            )
            .await
            .unwrap();

        assert_eq!(receipt.items.len(), 2);
        let items_total: Decimal = receipt.items.iter().map(|i| i.total).sum();
        assert_eq!(items_total, expected_total);
        assert_eq!(receipt.items[0].product_name, "Flour");
        assert_eq!(receipt.items[0].vat_amount, dec!(32.00));
        assert_eq!(receipt.points_earned, 281);
        assert_eq!(receipt.loyalty_balance, 381);
        assert_eq!(receipt.transaction.status, TransactionStatus::Completed);
    }
}
