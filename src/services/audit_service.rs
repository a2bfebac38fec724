use crate::entities::{AuditAction, audit_log_entity as audit_logs};
use crate::utils::RequestContext;
use chrono::Utc;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Set};
use serde_json::Value;
use uuid::Uuid;

/// One row of the audit trail, built up before it is written.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub model_name: &'static str,
    pub object_id: Option<String>,
    pub changes: Option<Value>,
}

impl AuditEntry {
    pub fn new(user_id: Option<Uuid>, action: AuditAction, model_name: &'static str) -> Self {
        Self {
            user_id,
            action,
            model_name,
            object_id: None,
            changes: None,
        }
    }

    pub fn object(mut self, id: impl ToString) -> Self {
        self.object_id = Some(id.to_string());
        self
    }

    pub fn changes(mut self, changes: Value) -> Self {
        self.changes = Some(changes);
        self
    }
}

/// Writes the entry on `db`, which may be the pool or an open transaction so
/// the audit row commits or rolls back together with the change it records.
pub async fn record<C: ConnectionTrait>(
    db: &C,
    entry: AuditEntry,
    ctx: &RequestContext,
) -> Result<(), DbErr> {
    let row = audit_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(entry.user_id),
        action: Set(entry.action),
        model_name: Set(entry.model_name.to_string()),
        object_id: Set(entry.object_id),
        changes: Set(entry.changes),
        ip_address: Set(ctx.ip_address.clone()),
        user_agent: Set(ctx.user_agent.clone()),
        timestamp: Set(Utc::now()),
    };
    audit_logs::Entity::insert(row)
        .exec_without_returning(db)
        .await?;
    log::debug!(
        "Audit {:?} on {} by {:?}",
        entry.action,
        entry.model_name,
        entry.user_id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction};
    use serde_json::json;

    #[test]
    fn builder_sets_object_and_changes() {
        let id = Uuid::new_v4();
        let entry = AuditEntry::new(Some(id), AuditAction::Update, "StoreInventory")
            .object(42)
            .changes(json!({"quantity": [3, 10]}));
        assert_eq!(entry.object_id.as_deref(), Some("42"));
        assert_eq!(entry.changes, Some(json!({"quantity": [3, 10]})));
        assert_eq!(entry.user_id, Some(id));
    }

    #[actix_web::test]
    async fn record_inserts_one_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let ctx = RequestContext {
            ip_address: Some("10.0.0.7".into()),
            user_agent: Some("pos-terminal/1.0".into()),
        };
        record(
            &db,
            AuditEntry::new(None, AuditAction::Login, "CustomUser"),
            &ctx,
        )
        .await
        .unwrap();

        let log: Vec<Transaction> = db.into_transaction_log();
        assert_eq!(log.len(), 1);
        let sql = format!("{:?}", log[0]);
        assert!(sql.contains("INSERT INTO"));
        assert!(sql.contains("audit_logs"));
        assert!(sql.contains("10.0.0.7"));
    }
}
