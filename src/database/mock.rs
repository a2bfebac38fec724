//! Helpers for services tested against `sea_orm::MockDatabase`.

use sea_orm::{DatabaseConnection, MockExecResult};
use std::sync::Arc;

pub fn exec_ok() -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: 1,
    }
}

/// Statements the mock saw, rendered for `contains` checks.
///
/// Every service built on `db` must be dropped first.
pub fn transaction_log(db: Arc<DatabaseConnection>) -> String {
    match Arc::try_unwrap(db) {
        Ok(conn) => format!("{:?}", conn.into_transaction_log()).replace("\\\"", "\""),
        Err(_) => panic!("mock connection is still shared"),
    }
}
