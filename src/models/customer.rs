use super::user::UserResponse;
use crate::entities::loyalty_programs::Model as LoyaltyProgram;
use crate::entities::payment_accounts::Model as PaymentAccount;
use crate::entities::shopping_sessions::Model as ShoppingSession;
use crate::entities::transactions::Model as Transaction;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerDashboard {
    pub user: UserResponse,
    pub total_purchases: u64,
    pub total_spent: Decimal,
    pub recent_transactions: Vec<Transaction>,
    pub active_session: Option<ShoppingSession>,
    pub loyalty: Option<LoyaltyProgram>,
    pub payment_accounts: Vec<PaymentAccount>,
    pub has_facial_data: bool,
}
