use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterFaceRequest {
    /// Base64 image, optionally as a `data:image/...;base64,` URL.
    pub face_image: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FaceStatusResponse {
    pub registered: bool,
    pub is_active: bool,
    pub is_locked: bool,
    pub confidence_threshold: Option<Decimal>,
    pub registration_date: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FaceRegistrationResponse {
    pub created: bool,
    pub status: FaceStatusResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyFaceRequest {
    pub user_id: Option<Uuid>,
    pub face_data: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyFaceResponse {
    pub success: bool,
    pub user_id: Option<Uuid>,
    pub confidence: Decimal,
    pub verified: bool,
}
