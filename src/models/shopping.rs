use crate::entities::payment_accounts::Model as PaymentAccount;
use crate::entities::products::Model as Product;
use crate::entities::shopping_cart::Model as CartItem;
use crate::entities::shopping_sessions::Model as ShoppingSession;
use crate::entities::stores::Model as Store;
use crate::entities::transaction_items::Model as TransactionItem;
use crate::entities::transactions::Model as Transaction;
use crate::services::pricing::{CartTotals, LineTotals};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartSessionRequest {
    pub store_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    /// Defaults to 1.
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    /// Zero or less removes the line.
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub payment_account_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineView {
    pub item: CartItem,
    pub product: Product,
    pub totals: LineTotals,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub session: ShoppingSession,
    pub store: Store,
    pub cart: Vec<CartLineView>,
    pub totals: CartTotals,
    /// Accounts the customer can pay with at checkout.
    pub payment_accounts: Vec<PaymentAccount>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutReceipt {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
    pub points_earned: i32,
    pub loyalty_balance: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub store: Option<Store>,
    pub items: Vec<TransactionItem>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    pub page: Option<u64>,
}
