pub mod audit_logs;
pub mod cameras;
pub mod counties;
pub mod customer_behavior;
pub mod daily_sales_reports;
pub mod face_recognition_logs;
pub mod facial_data;
pub mod loyalty_programs;
pub mod loyalty_transactions;
pub mod payment_accounts;
pub mod product_categories;
pub mod products;
pub mod promotions;
pub mod security_alerts;
pub mod shopping_cart;
pub mod shopping_sessions;
pub mod store_inventory;
pub mod stores;
pub mod transaction_items;
pub mod transactions;
pub mod users;

pub use audit_logs as audit_log_entity;
pub use cameras as camera_entity;
pub use counties as county_entity;
pub use customer_behavior as customer_behavior_entity;
pub use daily_sales_reports as daily_sales_report_entity;
pub use face_recognition_logs as face_recognition_log_entity;
pub use facial_data as facial_data_entity;
pub use loyalty_programs as loyalty_program_entity;
pub use loyalty_transactions as loyalty_transaction_entity;
pub use payment_accounts as payment_account_entity;
pub use product_categories as product_category_entity;
pub use products as product_entity;
pub use promotions as promotion_entity;
pub use security_alerts as security_alert_entity;
pub use shopping_cart as cart_item_entity;
pub use shopping_sessions as shopping_session_entity;
pub use store_inventory as store_inventory_entity;
pub use stores as store_entity;
pub use transaction_items as transaction_item_entity;
pub use transactions as transaction_entity;
pub use users as user_entity;

pub use audit_logs::AuditAction;
pub use cameras::CameraType;
pub use face_recognition_logs::{RecognitionResult, RecognitionType};
pub use loyalty_programs::LoyaltyTier;
pub use loyalty_transactions::LoyaltyTransactionType;
pub use payment_accounts::PaymentMethod;
pub use promotions::DiscountType;
pub use security_alerts::{AlertSeverity, AlertStatus, AlertType};
pub use shopping_sessions::SessionStatus;
pub use stores::StoreType;
pub use transactions::TransactionStatus;
pub use users::Gender;
