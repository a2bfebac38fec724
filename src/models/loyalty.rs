use crate::entities::loyalty_programs::Model as LoyaltyProgram;
use crate::entities::loyalty_transactions::Model as LoyaltyTransaction;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct LoyaltyDashboard {
    pub program: LoyaltyProgram,
    pub recent_transactions: Vec<LoyaltyTransaction>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RedeemPointsRequest {
    pub points: i32,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RedeemPointsResponse {
    pub entry: LoyaltyTransaction,
    pub current_balance: i32,
}
