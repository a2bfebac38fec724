use super::catalog::InventoryLine;
use crate::entities::security_alerts::Model as SecurityAlert;
use crate::entities::stores::Model as Store;
use crate::entities::transactions::Model as Transaction;
use crate::entities::{AlertSeverity, AlertStatus, PaymentMethod, RecognitionResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StoreRevenue {
    pub store_id: Uuid,
    pub store_name: String,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StaffDashboard {
    pub today_revenue: Decimal,
    pub today_count: u64,
    pub active_sessions: u64,
    pub recent_transactions: Vec<Transaction>,
    pub open_alerts: Vec<SecurityAlert>,
    pub top_stores: Vec<StoreRevenue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyRevenue {
    pub report_date: NaiveDate,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaymentMethodBreakdown {
    pub payment_method: PaymentMethod,
    pub count: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecognitionStat {
    pub result: RecognitionResult,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Analytics {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_revenue: Vec<DailyRevenue>,
    pub payment_breakdown: Vec<PaymentMethodBreakdown>,
    pub recognition_stats: Vec<RecognitionStat>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryOverview {
    pub store: Store,
    pub inventory: Vec<InventoryLine>,
    pub low_stock: Vec<InventoryLine>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInventoryRequest {
    pub quantity: i32,
    pub is_available: Option<bool>,
    #[schema(example = "Weekly restock")]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AlertQuery {
    pub status: Option<AlertStatus>,
    pub severity: Option<AlertSeverity>,
    pub page: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAlertRequest {
    pub status: AlertStatus,
    pub resolution_notes: Option<String>,
    pub assigned_to_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GenerateReportRequest {
    /// All active stores when omitted.
    pub store_id: Option<Uuid>,
    /// Today when omitted.
    pub report_date: Option<NaiveDate>,
}
