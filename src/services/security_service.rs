use crate::entities::{
    AlertSeverity, AlertStatus, AlertType, AuditAction, RecognitionResult, RecognitionType,
    face_recognition_log_entity as recognition_logs, security_alert_entity as alerts,
};
use crate::error::{AppError, AppResult};
use crate::models::{AlertQuery, PaginatedResponse, PaginationParams, UpdateAlertRequest};
use crate::services::audit_service::{self, AuditEntry};
use crate::utils::{ALERT_PREFIX, RequestContext, generate_reference_code};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub const ALERTS_PAGE_SIZE: u64 = 20;

/// A camera sighting to append to the recognition log.
#[derive(Debug, Clone)]
pub struct RecognitionEntry {
    pub user_id: Option<Uuid>,
    pub camera_id: Option<Uuid>,
    pub store_id: Uuid,
    pub recognition_type: RecognitionType,
    pub result: RecognitionResult,
    pub confidence_score: Decimal,
    pub session_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
    pub processing_time_ms: Option<i32>,
    pub error_message: Option<String>,
}

impl RecognitionEntry {
    pub fn new(
        store_id: Uuid,
        recognition_type: RecognitionType,
        result: RecognitionResult,
        confidence_score: Decimal,
    ) -> Self {
        Self {
            user_id: None,
            camera_id: None,
            store_id,
            recognition_type,
            result,
            confidence_score,
            session_id: None,
            transaction_id: None,
            processing_time_ms: None,
            error_message: None,
        }
    }
}

pub async fn log_recognition<C: ConnectionTrait>(
    db: &C,
    entry: RecognitionEntry,
) -> Result<(), DbErr> {
    let row = recognition_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(entry.user_id),
        camera_id: Set(entry.camera_id),
        store_id: Set(entry.store_id),
        recognition_type: Set(entry.recognition_type),
        result: Set(entry.result),
        confidence_score: Set(entry.confidence_score),
        session_id: Set(entry.session_id),
        transaction_id: Set(entry.transaction_id),
        processing_time_ms: Set(entry.processing_time_ms),
        error_message: Set(entry.error_message),
        timestamp: Set(Utc::now()),
    };
    recognition_logs::Entity::insert(row)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewAlert {
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub store_id: Uuid,
    pub user_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
    pub description: String,
}

/// Opens a security alert and returns its `ALERT-YYYYMMDD-XXXXXXXX` code.
pub async fn raise_alert<C: ConnectionTrait>(db: &C, alert: NewAlert) -> Result<String, DbErr> {
    let now = Utc::now();
    let alert_code = generate_reference_code(ALERT_PREFIX, now);
    let row = alerts::ActiveModel {
        id: Set(Uuid::new_v4()),
        alert_code: Set(alert_code.clone()),
        alert_type: Set(alert.alert_type),
        severity: Set(alert.severity),
        status: Set(AlertStatus::Open),
        user_id: Set(alert.user_id),
        store_id: Set(alert.store_id),
        session_id: Set(alert.session_id),
        transaction_id: Set(alert.transaction_id),
        description: Set(alert.description),
        resolution_notes: Set(None),
        assigned_to_id: Set(None),
        created_at: Set(now),
        resolved_at: Set(None),
        updated_at: Set(now),
    };
    alerts::Entity::insert(row).exec_without_returning(db).await?;
    log::warn!(
        "Security alert {alert_code} raised: {:?} / {:?}",
        alert.alert_type,
        alert.severity
    );
    Ok(alert_code)
}

#[derive(Clone)]
pub struct SecurityService {
    pool: Arc<DatabaseConnection>,
}

impl SecurityService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    pub async fn list_alerts(
        &self,
        query: &AlertQuery,
    ) -> AppResult<PaginatedResponse<alerts::Model>> {
        let params = PaginationParams::with_page_size(query.page, ALERTS_PAGE_SIZE);

        let mut select = alerts::Entity::find();
        if let Some(status) = query.status {
            select = select.filter(alerts::Column::Status.eq(status));
        }
        if let Some(severity) = query.severity {
            select = select.filter(alerts::Column::Severity.eq(severity));
        }

        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_desc(alerts::Column::CreatedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(self.pool.as_ref())
            .await?;

        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// Moves an alert through its workflow. Closing statuses stamp `resolved_at`.
    pub async fn update_alert(
        &self,
        staff_id: Uuid,
        alert_id: Uuid,
        request: UpdateAlertRequest,
        ctx: &RequestContext,
    ) -> AppResult<alerts::Model> {
        let txn = self.pool.begin().await?;

        let alert = alerts::Entity::find_by_id(alert_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Security alert not found".to_string()))?;

        let previous = alert.status;
        let now = Utc::now();
        let mut am = alert.into_active_model();
        am.status = Set(request.status);
        if let Some(notes) = request.resolution_notes {
            am.resolution_notes = Set(Some(notes));
        }
        if let Some(assignee) = request.assigned_to_id {
            am.assigned_to_id = Set(Some(assignee));
        }
        am.resolved_at = Set(request.status.is_terminal().then_some(now));
        am.updated_at = Set(now);
        let updated = am.update(&txn).await?;

        audit_service::record(
            &txn,
            AuditEntry::new(Some(staff_id), AuditAction::Update, "SecurityAlert")
                .object(updated.id)
                .changes(json!({ "status": [previous, updated.status] })),
            ctx,
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mock::exec_ok;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn alert(status: AlertStatus) -> alerts::Model {
        let now = Utc::now();
        alerts::Model {
            id: Uuid::new_v4(),
            alert_code: "ALERT-20251001-0A1B2C3D".into(),
            alert_type: AlertType::MultipleFail,
            severity: AlertSeverity::High,
            status,
            user_id: None,
            store_id: Uuid::new_v4(),
            session_id: None,
            transaction_id: None,
            description: "Locked profile attempted entry".into(),
            resolution_notes: None,
            assigned_to_id: None,
            created_at: now,
            resolved_at: None,
            updated_at: now,
        }
    }

    #[actix_web::test]
    async fn raise_alert_returns_generated_code() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec_ok()])
            .into_connection();
        let code = raise_alert(
            &db,
            NewAlert {
                alert_type: AlertType::MultipleFail,
                severity: AlertSeverity::High,
                store_id: Uuid::new_v4(),
                user_id: None,
                session_id: None,
                transaction_id: None,
                description: "test".into(),
            },
        )
        .await
        .unwrap();
        assert!(code.starts_with("ALERT-"));
        assert_eq!(code.len(), "ALERT-20251001-0A1B2C3D".len());
    }

    #[actix_web::test]
    async fn resolving_an_alert_sets_resolved_at() {
        let open = alert(AlertStatus::Open);
        let mut resolved = open.clone();
        resolved.status = AlertStatus::Resolved;
        resolved.resolved_at = Some(Utc::now());
        resolved.resolution_notes = Some("Customer verified at desk".into());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![open.clone()]])
            .append_query_results([vec![resolved.clone()]])
            .append_exec_results([exec_ok()])
            .into_connection();
        let svc = SecurityService::new(Arc::new(db));

        let updated = svc
            .update_alert(
                Uuid::new_v4(),
                open.id,
                UpdateAlertRequest {
                    status: AlertStatus::Resolved,
                    resolution_notes: Some("Customer verified at desk".into()),
                    assigned_to_id: None,
                },
                &RequestContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AlertStatus::Resolved);
        assert!(updated.resolved_at.is_some());
    }

    #[actix_web::test]
    async fn updating_missing_alert_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<alerts::Model>::new()])
            .into_connection();
        let svc = SecurityService::new(Arc::new(db));
        let err = svc
            .update_alert(
                Uuid::new_v4(),
                Uuid::new_v4(),
                UpdateAlertRequest {
                    status: AlertStatus::Investigating,
                    resolution_notes: None,
                    assigned_to_id: None,
                },
                &RequestContext::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
