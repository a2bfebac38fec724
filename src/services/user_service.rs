use crate::entities::{
    AuditAction, SessionStatus, TransactionStatus, facial_data_entity as facial_data,
    loyalty_program_entity as loyalty_programs, payment_account_entity as payment_accounts,
    shopping_session_entity as sessions, store_entity as stores,
    transaction_entity as transactions, transaction_item_entity as transaction_items,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::audit_service::{self, AuditEntry};
use crate::services::auth_service::normalize_email;
use crate::utils::{RequestContext, normalize_kenyan_phone};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

pub const TRANSACTIONS_PAGE_SIZE: u64 = 20;
const DASHBOARD_RECENT_TRANSACTIONS: u64 = 5;

#[derive(Debug, sea_orm::FromQueryResult)]
struct SpentRow {
    total: Option<Decimal>,
}

#[derive(Clone)]
pub struct UserService {
    pool: Arc<DatabaseConnection>,
}

impl UserService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    async fn find_user(&self, user_id: Uuid) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<UserResponse> {
        Ok(self.find_user(user_id).await?.into())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
        ctx: &RequestContext,
    ) -> AppResult<UserResponse> {
        let user = self.find_user(user_id).await?;
        let mut changes = Map::new();
        let mut am = user.clone().into_active_model();

        if let Some(first_name) = request.first_name {
            changes.insert("first_name".into(), Value::from(first_name.as_str()));
            am.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = request.last_name {
            changes.insert("last_name".into(), Value::from(last_name.as_str()));
            am.last_name = Set(last_name.trim().to_string());
        }
        if let Some(email) = request.email {
            let email = normalize_email(&email)?;
            if email != user.email {
                let taken = users::Entity::find()
                    .filter(users::Column::Email.eq(&email))
                    .filter(users::Column::Id.ne(user_id))
                    .count(self.pool.as_ref())
                    .await?;
                if taken > 0 {
                    return Err(AppError::Conflict("Email already registered".to_string()));
                }
                changes.insert("email".into(), Value::from(email.as_str()));
                am.email = Set(email);
            }
        }
        if let Some(phone) = request.phone_number {
            let phone = normalize_kenyan_phone(&phone)?;
            if phone != user.phone_number {
                let taken = users::Entity::find()
                    .filter(users::Column::PhoneNumber.eq(&phone))
                    .filter(users::Column::Id.ne(user_id))
                    .count(self.pool.as_ref())
                    .await?;
                if taken > 0 {
                    return Err(AppError::Conflict(
                        "Phone number already registered".to_string(),
                    ));
                }
                changes.insert("phone_number".into(), Value::from(phone.as_str()));
                am.phone_number = Set(phone);
            }
        }
        if let Some(gender) = request.gender {
            changes.insert("gender".into(), serde_json::to_value(gender)?);
            am.gender = Set(Some(gender));
        }

        if changes.is_empty() {
            return Ok(user.into());
        }
        am.updated_at = Set(Utc::now());

        let txn = self.pool.begin().await?;
        let updated = am
            .update(&txn)
            .await
            .map_err(|e| AppError::from_unique_violation(e, "Email or phone already registered"))?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(user_id), AuditAction::Update, "CustomUser")
                .object(user_id)
                .changes(Value::Object(changes)),
            ctx,
        )
        .await?;
        txn.commit().await?;

        Ok(updated.into())
    }

    pub async fn dashboard(&self, user_id: Uuid) -> AppResult<CustomerDashboard> {
        let user = self.find_user(user_id).await?;

        let completed = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed));
        let total_purchases = completed.clone().count(self.pool.as_ref()).await?;
        let total_spent = completed
            .select_only()
            .column_as(transactions::Column::TotalAmount.sum(), "total")
            .into_model::<SpentRow>()
            .one(self.pool.as_ref())
            .await?
            .and_then(|r| r.total)
            .unwrap_or(Decimal::ZERO);

        let recent_transactions = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::InitiatedAt)
            .limit(DASHBOARD_RECENT_TRANSACTIONS)
            .all(self.pool.as_ref())
            .await?;

        let active_session = sessions::Entity::find()
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::Status.eq(SessionStatus::Active))
            .one(self.pool.as_ref())
            .await?;

        let loyalty = loyalty_programs::Entity::find()
            .filter(loyalty_programs::Column::UserId.eq(user_id))
            .one(self.pool.as_ref())
            .await?;

        let payment_accounts = payment_accounts::Entity::find()
            .filter(payment_accounts::Column::UserId.eq(user_id))
            .filter(payment_accounts::Column::IsActive.eq(true))
            .order_by_desc(payment_accounts::Column::IsPrimary)
            .all(self.pool.as_ref())
            .await?;

        let has_facial_data = facial_data::Entity::find()
            .filter(facial_data::Column::UserId.eq(user_id))
            .filter(facial_data::Column::IsActive.eq(true))
            .count(self.pool.as_ref())
            .await?
            > 0;

        Ok(CustomerDashboard {
            user: user.into(),
            total_purchases,
            total_spent,
            recent_transactions,
            active_session,
            loyalty,
            payment_accounts,
            has_facial_data,
        })
    }

    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        page: Option<u64>,
    ) -> AppResult<PaginatedResponse<transactions::Model>> {
        let params = PaginationParams::with_page_size(page, TRANSACTIONS_PAGE_SIZE);
        let query = transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id));

        let total = query.clone().count(self.pool.as_ref()).await?;
        let items = query
            .order_by_desc(transactions::Column::InitiatedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(self.pool.as_ref())
            .await?;

        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// A transaction with its line items; only visible to its owner.
    pub async fn transaction_detail(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> AppResult<TransactionDetail> {
        let transaction = transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::UserId.eq(user_id))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

        let items = transaction_items::Entity::find()
            .filter(transaction_items::Column::TransactionId.eq(transaction.id))
            .order_by_asc(transaction_items::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;

        let store = stores::Entity::find_by_id(transaction.store_id)
            .one(self.pool.as_ref())
            .await?;

        Ok(TransactionDetail {
            transaction,
            store,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[actix_web::test]
    async fn foreign_transaction_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<transactions::Model>::new()])
            .into_connection();
        let svc = UserService::new(Arc::new(db));
        let err = svc
            .transaction_detail(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn missing_user_profile_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let svc = UserService::new(Arc::new(db));
        assert!(matches!(
            svc.get_profile(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
