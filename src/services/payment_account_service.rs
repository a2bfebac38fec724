use crate::entities::{
    AuditAction, PaymentMethod, payment_account_entity as accounts,
    transaction_entity as transactions,
};
use crate::error::{AppError, AppResult};
use crate::models::AddPaymentAccountRequest;
use crate::services::audit_service::{self, AuditEntry};
use crate::utils::{RequestContext, normalize_card_number, normalize_kenyan_phone};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_DAILY_LIMIT: i64 = 50_000;
pub const DEFAULT_TRANSACTION_LIMIT: i64 = 10_000;

/// Canonical form of an account number for the given method.
pub fn normalize_account_number(method: PaymentMethod, raw: &str) -> AppResult<String> {
    match method {
        m if m.is_mobile_money() => normalize_kenyan_phone(raw),
        PaymentMethod::Card => normalize_card_number(raw),
        PaymentMethod::Bank => {
            let number = raw.trim();
            if number.is_empty() {
                return Err(AppError::ValidationError(
                    "Account number is required".to_string(),
                ));
            }
            Ok(number.to_string())
        }
        _ => Err(AppError::ValidationError(
            "Cash cannot be saved as a payment account".to_string(),
        )),
    }
}

async fn clear_primary<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    except: Option<Uuid>,
) -> Result<(), DbErr> {
    let mut update = accounts::Entity::update_many()
        .col_expr(accounts::Column::IsPrimary, Expr::value(false))
        .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(accounts::Column::UserId.eq(user_id))
        .filter(accounts::Column::IsPrimary.eq(true));
    if let Some(id) = except {
        update = update.filter(accounts::Column::Id.ne(id));
    }
    update.exec(db).await?;
    Ok(())
}

#[derive(Clone)]
pub struct PaymentAccountService {
    pool: Arc<DatabaseConnection>,
}

impl PaymentAccountService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<accounts::Model>> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::IsActive.eq(true))
            .order_by_desc(accounts::Column::IsPrimary)
            .order_by_desc(accounts::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?)
    }

    async fn find_owned(&self, user_id: Uuid, account_id: Uuid) -> AppResult<accounts::Model> {
        accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::IsActive.eq(true))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Payment account not found".to_string()))
    }

    pub async fn add(
        &self,
        user_id: Uuid,
        request: AddPaymentAccountRequest,
        ctx: &RequestContext,
    ) -> AppResult<accounts::Model> {
        let account_number =
            normalize_account_number(request.payment_method, &request.account_number)?;
        let account_name = request.account_name.trim().to_string();
        if account_name.is_empty() {
            return Err(AppError::ValidationError(
                "Account name is required".to_string(),
            ));
        }

        let existing = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::AccountNumber.eq(&account_number))
            .one(self.pool.as_ref())
            .await?;
        if existing.as_ref().is_some_and(|account| account.is_active) {
            return Err(AppError::Conflict(
                "This payment account is already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        if request.is_primary {
            clear_primary(&txn, user_id, None).await?;
        }

        // A removed account that still backs past payments comes back in place.
        if let Some(removed) = existing {
            let mut am = removed.into_active_model();
            am.payment_method = Set(request.payment_method);
            am.account_name = Set(account_name);
            am.is_primary = Set(request.is_primary);
            am.is_active = Set(true);
            am.updated_at = Set(now);
            let account = am.update(&txn).await?;

            audit_service::record(
                &txn,
                AuditEntry::new(Some(user_id), AuditAction::Update, "PaymentAccount")
                    .object(account.id)
                    .changes(json!({ "is_active": [false, true] })),
                ctx,
            )
            .await?;
            txn.commit().await?;

            log::info!("User {user_id} reactivated payment account {}", account.id);
            return Ok(account);
        }

        let account = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            payment_method: Set(request.payment_method),
            account_number: Set(account_number),
            account_name: Set(account_name),
            provider_reference: Set(None),
            is_primary: Set(request.is_primary),
            is_verified: Set(false),
            is_active: Set(true),
            daily_limit: Set(Decimal::from(DEFAULT_DAILY_LIMIT)),
            transaction_limit: Set(Decimal::from(DEFAULT_TRANSACTION_LIMIT)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "This payment account is already registered")
        })?;

        audit_service::record(
            &txn,
            AuditEntry::new(Some(user_id), AuditAction::Create, "PaymentAccount")
                .object(account.id)
                .changes(json!({ "payment_method": account.payment_method })),
            ctx,
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "User {user_id} added {} payment account {}",
            account.payment_method,
            account.id
        );
        Ok(account)
    }

    pub async fn set_primary(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        ctx: &RequestContext,
    ) -> AppResult<accounts::Model> {
        let account = self.find_owned(user_id, account_id).await?;

        let txn = self.pool.begin().await?;
        clear_primary(&txn, user_id, Some(account.id)).await?;
        let mut am = account.into_active_model();
        am.is_primary = Set(true);
        am.updated_at = Set(Utc::now());
        let account = am.update(&txn).await?;

        audit_service::record(
            &txn,
            AuditEntry::new(Some(user_id), AuditAction::Update, "PaymentAccount")
                .object(account.id)
                .changes(json!({ "is_primary": true })),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(account)
    }

    /// Removes an account. Accounts already used for payments are only
    /// deactivated so transaction history keeps its reference.
    pub async fn delete(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        ctx: &RequestContext,
    ) -> AppResult<()> {
        let account = self.find_owned(user_id, account_id).await?;
        let account_id = account.id;

        let used = transactions::Entity::find()
            .filter(transactions::Column::PaymentAccountId.eq(account_id))
            .count(self.pool.as_ref())
            .await?;

        let txn = self.pool.begin().await?;
        if used > 0 {
            let mut am = account.into_active_model();
            am.is_active = Set(false);
            am.is_primary = Set(false);
            am.updated_at = Set(Utc::now());
            am.update(&txn).await?;
        } else {
            account.delete(&txn).await?;
        }
        audit_service::record(
            &txn,
            AuditEntry::new(Some(user_id), AuditAction::Delete, "PaymentAccount")
                .object(account_id),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mock::{exec_ok, transaction_log};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn account(user_id: Uuid, is_active: bool) -> accounts::Model {
        let now = Utc::now();
        accounts::Model {
            id: Uuid::new_v4(),
            user_id,
            payment_method: PaymentMethod::Mpesa,
            account_number: "+254712345678".into(),
            account_name: "Wanjiku Kamau".into(),
            provider_reference: None,
            is_primary: false,
            is_verified: false,
            is_active,
            daily_limit: Decimal::from(DEFAULT_DAILY_LIMIT),
            transaction_limit: Decimal::from(DEFAULT_TRANSACTION_LIMIT),
            created_at: now,
            updated_at: now,
        }
    }

    fn mpesa_request() -> AddPaymentAccountRequest {
        AddPaymentAccountRequest {
            payment_method: PaymentMethod::Mpesa,
            account_number: "0712345678".into(),
            account_name: "Wanjiku Kamau".into(),
            is_primary: true,
        }
    }

    #[test]
    fn account_numbers_follow_their_method() {
        assert_eq!(
            normalize_account_number(PaymentMethod::Mpesa, "0712345678").unwrap(),
            "+254712345678"
        );
        assert_eq!(
            normalize_account_number(PaymentMethod::Card, "4111-1111-1111-1111").unwrap(),
            "4111111111111111"
        );
        assert!(normalize_account_number(PaymentMethod::Airtel, "12345").is_err());
        assert!(normalize_account_number(PaymentMethod::Bank, "  ").is_err());
        assert!(normalize_account_number(PaymentMethod::Cash, "0712345678").is_err());
    }

    #[actix_web::test]
    async fn duplicate_account_is_a_conflict() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![account(user_id, true)]])
            .into_connection();
        let err = PaymentAccountService::new(Arc::new(db))
            .add(user_id, mpesa_request(), &RequestContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_web::test]
    async fn removed_account_is_reactivated_when_added_again() {
        let user_id = Uuid::new_v4();
        let removed = account(user_id, false);
        let mut restored = removed.clone();
        restored.is_active = true;
        restored.is_primary = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![removed.clone()]])
                .append_query_results([vec![restored]])
                .append_exec_results([exec_ok(), exec_ok()])
                .into_connection(),
        );
        let account = PaymentAccountService::new(db.clone())
            .add(user_id, mpesa_request(), &RequestContext::default())
            .await
            .unwrap();
        assert_eq!(account.id, removed.id);
        assert!(account.is_active);
        assert!(account.is_primary);

        let log = transaction_log(db);
        assert!(log.contains(r#"UPDATE "payment_accounts""#));
        assert!(!log.contains(r#"INSERT INTO "payment_accounts""#));
        assert!(log.contains("audit_logs"));
    }

    #[actix_web::test]
    async fn foreign_account_cannot_be_made_primary() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<accounts::Model>::new()])
            .into_connection();
        let err = PaymentAccountService::new(Arc::new(db))
            .set_primary(Uuid::new_v4(), Uuid::new_v4(), &RequestContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
