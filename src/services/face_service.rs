//! Face enrolment. Recognition itself is mocked: the uploaded image is kept
//! as the "encoding" and every verification succeeds with a fixed score.

use crate::entities::{AuditAction, facial_data_entity as facial_data};
use crate::error::{AppError, AppResult};
use crate::models::{
    FaceRegistrationResponse, FaceStatusResponse, VerifyFaceRequest, VerifyFaceResponse,
};
use crate::services::audit_service::{self, AuditEntry};
use crate::utils::RequestContext;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

pub const MAX_FACE_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_CONFIDENCE_THRESHOLD: i64 = 95;
/// Score reported by the mock verifier, 97.50.
pub const MOCK_VERIFY_CONFIDENCE: Decimal = Decimal::from_parts(9750, 0, 0, false, 2);

/// Decodes an uploaded face image, accepting both bare base64 and
/// `data:image/...;base64,` URLs.
pub fn decode_face_image(raw: &str) -> AppResult<Vec<u8>> {
    let raw = raw.trim();
    let payload = match raw.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => raw,
    };
    if payload.is_empty() {
        return Err(AppError::ValidationError(
            "Please upload a face image".to_string(),
        ));
    }
    // base64 inflates by 4/3; reject before allocating the decoded buffer.
    if payload.len() / 4 * 3 > MAX_FACE_IMAGE_BYTES + 3 {
        return Err(AppError::ValidationError(
            "Image file too large (max 5MB)".to_string(),
        ));
    }
    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| AppError::ValidationError("Face image is not valid base64".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::ValidationError(
            "Please upload a face image".to_string(),
        ));
    }
    if bytes.len() > MAX_FACE_IMAGE_BYTES {
        return Err(AppError::ValidationError(
            "Image file too large (max 5MB)".to_string(),
        ));
    }
    Ok(bytes)
}

impl From<Option<&facial_data::Model>> for FaceStatusResponse {
    fn from(face: Option<&facial_data::Model>) -> Self {
        match face {
            Some(face) => Self {
                registered: true,
                is_active: face.is_active,
                is_locked: face.is_locked,
                confidence_threshold: Some(face.confidence_threshold),
                registration_date: Some(face.registration_date),
                last_updated: Some(face.last_updated),
            },
            None => Self {
                registered: false,
                is_active: false,
                is_locked: false,
                confidence_threshold: None,
                registration_date: None,
                last_updated: None,
            },
        }
    }
}

#[derive(Clone)]
pub struct FaceService {
    pool: Arc<DatabaseConnection>,
}

impl FaceService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    async fn find(&self, user_id: Uuid) -> AppResult<Option<facial_data::Model>> {
        Ok(facial_data::Entity::find()
            .filter(facial_data::Column::UserId.eq(user_id))
            .one(self.pool.as_ref())
            .await?)
    }

    pub async fn status(&self, user_id: Uuid) -> AppResult<FaceStatusResponse> {
        Ok(self.find(user_id).await?.as_ref().into())
    }

    /// Creates or replaces the user's face profile. Re-registering also
    /// unlocks a profile locked by failed recognitions.
    pub async fn register(
        &self,
        user_id: Uuid,
        face_image: &str,
        ctx: &RequestContext,
    ) -> AppResult<FaceRegistrationResponse> {
        let bytes = decode_face_image(face_image)?;
        let encoding = STANDARD.encode(bytes);
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        let existing = facial_data::Entity::find()
            .filter(facial_data::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;
        let created = existing.is_none();

        let face = match existing {
            Some(face) => {
                let mut am = face.into_active_model();
                am.face_encoding = Set(encoding);
                am.is_active = Set(true);
                am.is_locked = Set(false);
                am.failed_recognition_attempts = Set(0);
                am.confidence_threshold = Set(Decimal::from(DEFAULT_CONFIDENCE_THRESHOLD));
                am.last_updated = Set(now);
                am.update(&txn).await?
            }
            None => {
                facial_data::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    face_encoding: Set(encoding),
                    registration_date: Set(now),
                    last_updated: Set(now),
                    is_active: Set(true),
                    confidence_threshold: Set(Decimal::from(DEFAULT_CONFIDENCE_THRESHOLD)),
                    failed_recognition_attempts: Set(0),
                    last_recognition_attempt: Set(None),
                    is_locked: Set(false),
                }
                .insert(&txn)
                .await?
            }
        };

        let action = if created {
            AuditAction::Create
        } else {
            AuditAction::Update
        };
        audit_service::record(
            &txn,
            AuditEntry::new(Some(user_id), action, "FacialData").object(face.id),
            ctx,
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "Face profile {} for user {user_id}",
            if created { "registered" } else { "updated" }
        );
        Ok(FaceRegistrationResponse {
            created,
            status: Some(&face).into(),
        })
    }

    pub async fn delete(&self, user_id: Uuid, ctx: &RequestContext) -> AppResult<()> {
        let face = self
            .find(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No facial data found".to_string()))?;
        let face_id = face.id;

        let txn = self.pool.begin().await?;
        face.delete(&txn).await?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(user_id), AuditAction::Delete, "FacialData").object(face_id),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }

    pub fn verify(&self, request: &VerifyFaceRequest) -> VerifyFaceResponse {
        VerifyFaceResponse {
            success: true,
            user_id: request.user_id,
            confidence: MOCK_VERIFY_CONFIDENCE,
            verified: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn face(user_id: Uuid, locked: bool) -> facial_data::Model {
        let now = Utc::now();
        facial_data::Model {
            id: Uuid::new_v4(),
            user_id,
            face_encoding: "aGVsbG8=".into(),
            registration_date: now,
            last_updated: now,
            is_active: true,
            confidence_threshold: dec!(90),
            failed_recognition_attempts: 4,
            last_recognition_attempt: None,
            is_locked: locked,
        }
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        assert_eq!(
            decode_face_image("data:image/png;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
        assert_eq!(decode_face_image("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn empty_and_invalid_images_are_rejected() {
        match decode_face_image("  ") {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, "Please upload a face image"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(decode_face_image("data:image/png;base64,").is_err());
        assert!(decode_face_image("***").is_err());
    }

    #[test]
    fn oversized_images_are_rejected() {
        let big = STANDARD.encode(vec![0u8; MAX_FACE_IMAGE_BYTES + 1]);
        match decode_face_image(&big) {
            Err(AppError::ValidationError(msg)) => {
                assert_eq!(msg, "Image file too large (max 5MB)")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn verification_is_a_fixed_mock() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let user_id = Uuid::new_v4();
        let response = FaceService::new(Arc::new(db)).verify(&VerifyFaceRequest {
            user_id: Some(user_id),
            face_data: None,
        });
        assert!(response.verified);
        assert_eq!(response.user_id, Some(user_id));
        assert_eq!(response.confidence, dec!(97.50));
    }

    #[actix_web::test]
    async fn re_registering_unlocks_the_profile() {
        let user_id = Uuid::new_v4();
        let locked = face(user_id, true);
        let mut unlocked = locked.clone();
        unlocked.is_locked = false;
        unlocked.failed_recognition_attempts = 0;
        unlocked.confidence_threshold = dec!(95);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![locked]])
            .append_query_results([vec![unlocked]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let response = FaceService::new(Arc::new(db))
            .register(user_id, "aGVsbG8=", &RequestContext::default())
            .await
            .unwrap();
        assert!(!response.created);
        assert!(!response.status.is_locked);
        assert_eq!(response.status.confidence_threshold, Some(dec!(95)));
    }

    #[actix_web::test]
    async fn deleting_missing_face_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<facial_data::Model>::new()])
            .into_connection();
        match FaceService::new(Arc::new(db))
            .delete(Uuid::new_v4(), &RequestContext::default())
            .await
        {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "No facial data found"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
