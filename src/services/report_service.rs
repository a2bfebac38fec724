//! Daily sales reports, one row per store and day.

use crate::entities::{
    RecognitionResult, TransactionStatus, daily_sales_report_entity as reports,
    face_recognition_log_entity as recognition_logs, store_entity as stores,
    transaction_entity as transactions, transaction_item_entity as transaction_items,
};
use crate::error::AppResult;
use crate::utils::local_day_bounds;
use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Figures of one store-day, computed before they are written.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFigures {
    pub total_transactions: i32,
    pub total_revenue: Decimal,
    pub total_vat: Decimal,
    pub unique_customers: i32,
    pub new_customers: i32,
    pub total_items_sold: i32,
    pub average_basket_size: Decimal,
    pub payment_breakdown: Value,
    pub successful_recognitions: i32,
    pub failed_recognitions: i32,
    pub average_confidence: Decimal,
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn count_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Aggregates a day's completed transactions and recognition events.
pub fn summarize(
    completed: &[transactions::Model],
    items_sold: i32,
    new_customers: i32,
    sightings: &[recognition_logs::Model],
) -> ReportFigures {
    let total_revenue: Decimal = completed.iter().map(|t| t.total_amount).sum();
    let total_vat: Decimal = completed.iter().map(|t| t.vat_amount).sum();
    let customers: HashSet<Uuid> = completed.iter().map(|t| t.user_id).collect();

    let mut breakdown: BTreeMap<String, (i64, Decimal)> = BTreeMap::new();
    for t in completed {
        let entry = breakdown
            .entry(t.payment_method.to_string())
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += t.total_amount;
    }
    let payment_breakdown = Value::Object(
        breakdown
            .into_iter()
            .map(|(method, (count, total))| {
                (method, json!({ "count": count, "total": total.to_string() }))
            })
            .collect(),
    );

    let average_basket_size = if completed.is_empty() {
        Decimal::ZERO
    } else {
        round2(total_revenue / Decimal::from(completed.len()))
    };

    let successful = sightings
        .iter()
        .filter(|s| s.result == RecognitionResult::Success)
        .count();
    let average_confidence = if sightings.is_empty() {
        Decimal::ZERO
    } else {
        let sum: Decimal = sightings.iter().map(|s| s.confidence_score).sum();
        round2(sum / Decimal::from(sightings.len()))
    };

    ReportFigures {
        total_transactions: count_i32(completed.len()),
        total_revenue,
        total_vat,
        unique_customers: count_i32(customers.len()),
        new_customers,
        total_items_sold: items_sold,
        average_basket_size,
        payment_breakdown,
        successful_recognitions: count_i32(successful),
        failed_recognitions: count_i32(sightings.len() - successful),
        average_confidence,
    }
}

async fn gather<C: ConnectionTrait>(
    db: &C,
    store_id: Uuid,
    date: NaiveDate,
) -> Result<ReportFigures, DbErr> {
    let (start, end) = local_day_bounds(date);

    let completed = transactions::Entity::find()
        .filter(transactions::Column::StoreId.eq(store_id))
        .filter(transactions::Column::Status.eq(TransactionStatus::Completed))
        .filter(transactions::Column::CompletedAt.gte(start))
        .filter(transactions::Column::CompletedAt.lt(end))
        .all(db)
        .await?;

    let (items_sold, new_customers) = if completed.is_empty() {
        (0, 0)
    } else {
        let ids: Vec<Uuid> = completed.iter().map(|t| t.id).collect();
        let items_sold: i64 = transaction_items::Entity::find()
            .select_only()
            .column(transaction_items::Column::Quantity)
            .filter(transaction_items::Column::TransactionId.is_in(ids))
            .into_tuple::<i32>()
            .all(db)
            .await?
            .into_iter()
            .map(i64::from)
            .sum();

        let customers: HashSet<Uuid> = completed.iter().map(|t| t.user_id).collect();
        let returning: HashSet<Uuid> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::UserId)
            .distinct()
            .filter(transactions::Column::UserId.is_in(customers.iter().copied()))
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed))
            .filter(transactions::Column::CompletedAt.lt(start))
            .into_tuple::<Uuid>()
            .all(db)
            .await?
            .into_iter()
            .collect();
        (
            i32::try_from(items_sold).unwrap_or(i32::MAX),
            count_i32(customers.difference(&returning).count()),
        )
    };

    let sightings = recognition_logs::Entity::find()
        .filter(recognition_logs::Column::StoreId.eq(store_id))
        .filter(recognition_logs::Column::Timestamp.gte(start))
        .filter(recognition_logs::Column::Timestamp.lt(end))
        .all(db)
        .await?;

    Ok(summarize(&completed, items_sold, new_customers, &sightings))
}

/// Recomputes and stores the report of one store-day, replacing any earlier run.
pub async fn generate_for_store<C: ConnectionTrait>(
    db: &C,
    store_id: Uuid,
    date: NaiveDate,
) -> Result<reports::Model, DbErr> {
    let figures = gather(db, store_id, date).await?;
    let now = Utc::now();

    let row = reports::ActiveModel {
        id: Set(Uuid::new_v4()),
        store_id: Set(store_id),
        report_date: Set(date),
        total_transactions: Set(figures.total_transactions),
        total_revenue: Set(figures.total_revenue),
        total_vat: Set(figures.total_vat),
        unique_customers: Set(figures.unique_customers),
        new_customers: Set(figures.new_customers),
        total_items_sold: Set(figures.total_items_sold),
        average_basket_size: Set(figures.average_basket_size),
        payment_breakdown: Set(figures.payment_breakdown),
        successful_recognitions: Set(figures.successful_recognitions),
        failed_recognitions: Set(figures.failed_recognitions),
        average_confidence: Set(figures.average_confidence),
        created_at: Set(now),
        updated_at: Set(now),
    };
    reports::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([reports::Column::StoreId, reports::Column::ReportDate])
                .update_columns([
                    reports::Column::TotalTransactions,
                    reports::Column::TotalRevenue,
                    reports::Column::TotalVat,
                    reports::Column::UniqueCustomers,
                    reports::Column::NewCustomers,
                    reports::Column::TotalItemsSold,
                    reports::Column::AverageBasketSize,
                    reports::Column::PaymentBreakdown,
                    reports::Column::SuccessfulRecognitions,
                    reports::Column::FailedRecognitions,
                    reports::Column::AverageConfidence,
                    reports::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    reports::Entity::find()
        .filter(reports::Column::StoreId.eq(store_id))
        .filter(reports::Column::ReportDate.eq(date))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("daily sales report".to_string()))
}

#[derive(Clone)]
pub struct ReportService {
    pool: Arc<DatabaseConnection>,
}

impl ReportService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    /// Reports for one store, or every active store when `store_id` is `None`.
    pub async fn generate(
        &self,
        store_id: Option<Uuid>,
        date: NaiveDate,
    ) -> AppResult<Vec<reports::Model>> {
        let store_ids: Vec<Uuid> = match store_id {
            Some(id) => vec![id],
            None => stores::Entity::find()
                .select_only()
                .column(stores::Column::Id)
                .filter(stores::Column::IsActive.eq(true))
                .order_by_asc(stores::Column::Name)
                .into_tuple::<Uuid>()
                .all(self.pool.as_ref())
                .await?,
        };

        let mut generated = Vec::with_capacity(store_ids.len());
        for id in store_ids {
            generated.push(generate_for_store(self.pool.as_ref(), id, date).await?);
        }
        log::info!("Generated {} daily sales report(s) for {date}", generated.len());
        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{PaymentMethod, RecognitionType};
    use rust_decimal_macros::dec;

    fn completed(
        user_id: Uuid,
        method: PaymentMethod,
        total: Decimal,
        vat: Decimal,
    ) -> transactions::Model {
        let now = Utc::now();
        transactions::Model {
            id: Uuid::new_v4(),
            transaction_code: "TXN-20250309-0A1B2C3D".into(),
            session_id: Uuid::new_v4(),
            user_id,
            store_id: Uuid::new_v4(),
            payment_account_id: Uuid::new_v4(),
            payment_method: method,
            subtotal: total - vat,
            vat_amount: vat,
            discount_amount: Decimal::ZERO,
            total_amount: total,
            provider_transaction_id: None,
            provider_response: None,
            checkout_camera_id: None,
            face_recognition_confidence: dec!(96.80),
            status: TransactionStatus::Completed,
            initiated_at: now,
            completed_at: Some(now),
            receipt_number: None,
            receipt_url: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sighting(result: RecognitionResult, confidence: Decimal) -> recognition_logs::Model {
        recognition_logs::Model {
            id: Uuid::new_v4(),
            user_id: None,
            camera_id: None,
            store_id: Uuid::new_v4(),
            recognition_type: RecognitionType::Entry,
            result,
            confidence_score: confidence,
            session_id: None,
            transaction_id: None,
            processing_time_ms: Some(150),
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn summary_of_a_day() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let day = [
            completed(alice, PaymentMethod::Mpesa, dec!(232.00), dec!(32.00)),
            completed(alice, PaymentMethod::Mpesa, dec!(100.00), dec!(0)),
            completed(bob, PaymentMethod::Card, dec!(50.50), dec!(6.97)),
        ];
        let sightings = [
            sighting(RecognitionResult::Success, dec!(97.50)),
            sighting(RecognitionResult::Success, dec!(96.80)),
            sighting(RecognitionResult::Blocked, dec!(0)),
        ];

        let figures = summarize(&day, 7, 1, &sightings);

        assert_eq!(figures.total_transactions, 3);
        assert_eq!(figures.total_revenue, dec!(382.50));
        assert_eq!(figures.total_vat, dec!(38.97));
        assert_eq!(figures.unique_customers, 2);
        assert_eq!(figures.new_customers, 1);
        assert_eq!(figures.total_items_sold, 7);
        assert_eq!(figures.average_basket_size, dec!(127.50));
        assert_eq!(figures.payment_breakdown["MPESA"]["count"], 2);
        assert_eq!(figures.payment_breakdown["CARD"]["total"], "50.50");
        assert_eq!(figures.successful_recognitions, 2);
        assert_eq!(figures.failed_recognitions, 1);
        assert_eq!(figures.average_confidence, dec!(64.77));
    }

    #[test]
    fn empty_day_is_all_zeroes() {
        let figures = summarize(&[], 0, 0, &[]);
        assert_eq!(figures.total_transactions, 0);
        assert_eq!(figures.average_basket_size, Decimal::ZERO);
        assert_eq!(figures.average_confidence, Decimal::ZERO);
        assert_eq!(figures.payment_breakdown, json!({}));
    }
}
