//! Per-customer shopping profile, maintained as a side effect of session
//! starts and checkouts.

use crate::entities::{customer_behavior_entity as behavior, shopping_session_entity as sessions};
use chrono::{DateTime, Local, Timelike, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::Value;
use uuid::Uuid;

const FAVORITE_CATEGORY_LIMIT: usize = 5;

pub fn shopping_time_bucket(hour: u32) -> &'static str {
    match hour {
        5..=11 => "MORNING",
        12..=16 => "AFTERNOON",
        17..=20 => "EVENING",
        _ => "NIGHT",
    }
}

/// Mean of `samples` values averaging `current`, extended by `next`.
pub fn rolling_average(current: i32, samples: i32, next: i32) -> i32 {
    if samples <= 0 {
        return next;
    }
    let total = i64::from(current) * i64::from(samples) + i64::from(next);
    (total / (i64::from(samples) + 1)) as i32
}

/// Most recently bought categories first, then the previous favourites.
pub fn merge_favorite_categories(existing: &Value, purchased: &[Uuid]) -> Value {
    let mut merged: Vec<String> = Vec::with_capacity(FAVORITE_CATEGORY_LIMIT);
    let previous = existing
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str().map(str::to_string));
    for id in purchased.iter().map(Uuid::to_string).chain(previous) {
        if merged.len() == FAVORITE_CATEGORY_LIMIT {
            break;
        }
        if !merged.contains(&id) {
            merged.push(id);
        }
    }
    Value::from(merged)
}

#[derive(Debug, FromQueryResult)]
struct StoreVisits {
    store_id: Uuid,
}

fn blank_profile(user_id: Uuid, now: DateTime<Utc>) -> behavior::ActiveModel {
    behavior::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total_visits: Set(0),
        total_purchases: Set(0),
        total_spent: Set(Decimal::ZERO),
        favorite_store_id: Set(None),
        favorite_categories: Set(Value::Array(vec![])),
        preferred_shopping_time: Set(None),
        average_session_duration: Set(0),
        last_visit: Set(None),
        last_purchase: Set(None),
        updated_at: Set(now),
    }
}

/// Counts a store entry and refreshes the favourite store. Call after the
/// session row exists so it is part of the tally.
pub async fn record_visit<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    at: DateTime<Utc>,
) -> Result<(), DbErr> {
    let mut row = blank_profile(user_id, at);
    row.total_visits = Set(1);
    row.last_visit = Set(Some(at));
    behavior::Entity::insert(row)
        .on_conflict(
            OnConflict::column(behavior::Column::UserId)
                .value(
                    behavior::Column::TotalVisits,
                    Expr::col((behavior::Entity, behavior::Column::TotalVisits)).add(1),
                )
                .update_columns([behavior::Column::LastVisit, behavior::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let favorite = sessions::Entity::find()
        .select_only()
        .column(sessions::Column::StoreId)
        .filter(sessions::Column::UserId.eq(user_id))
        .group_by(sessions::Column::StoreId)
        .order_by_desc(sessions::Column::Id.count())
        .limit(1)
        .into_model::<StoreVisits>()
        .one(db)
        .await?;

    if let Some(favorite) = favorite {
        behavior::Entity::update_many()
            .col_expr(
                behavior::Column::FavoriteStoreId,
                Expr::value(favorite.store_id),
            )
            .filter(behavior::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
    }
    Ok(())
}

/// What a completed checkout contributes to the profile.
#[derive(Debug, Clone)]
pub struct PurchaseFacts {
    pub total: Decimal,
    pub session_started: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Categories of the basket, most bought first.
    pub categories: Vec<Uuid>,
}

pub async fn record_purchase<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    facts: PurchaseFacts,
) -> Result<behavior::Model, DbErr> {
    let profile = match behavior::Entity::find()
        .filter(behavior::Column::UserId.eq(user_id))
        .one(db)
        .await?
    {
        Some(profile) => profile,
        None => blank_profile(user_id, facts.completed_at).insert(db).await?,
    };

    let minutes = (facts.completed_at - facts.session_started)
        .num_minutes()
        .clamp(0, i64::from(i32::MAX)) as i32;
    let local_hour = facts.completed_at.with_timezone(&Local).hour();

    let purchases = profile.total_purchases;
    let spent = profile.total_spent;
    let average = rolling_average(profile.average_session_duration, purchases, minutes);
    let categories = merge_favorite_categories(&profile.favorite_categories, &facts.categories);

    let mut am = profile.into_active_model();
    am.total_purchases = Set(purchases + 1);
    am.total_spent = Set(spent + facts.total);
    am.average_session_duration = Set(average);
    am.preferred_shopping_time = Set(Some(shopping_time_bucket(local_hour).to_string()));
    am.favorite_categories = Set(categories);
    am.last_purchase = Set(Some(facts.completed_at));
    am.updated_at = Set(facts.completed_at);
    am.update(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hours_map_to_day_parts() {
        assert_eq!(shopping_time_bucket(7), "MORNING");
        assert_eq!(shopping_time_bucket(12), "AFTERNOON");
        assert_eq!(shopping_time_bucket(18), "EVENING");
        assert_eq!(shopping_time_bucket(23), "NIGHT");
        assert_eq!(shopping_time_bucket(3), "NIGHT");
    }

    #[test]
    fn rolling_average_weights_previous_samples() {
        assert_eq!(rolling_average(0, 0, 30), 30);
        assert_eq!(rolling_average(20, 3, 40), 25);
    }

    #[test]
    fn favorite_categories_put_latest_first_and_cap_at_five() {
        let old: Vec<String> = (0..5).map(|_| Uuid::new_v4().to_string()).collect();
        let fresh = Uuid::new_v4();
        let repeat = Uuid::parse_str(&old[2]).unwrap();

        let merged = merge_favorite_categories(&json!(old), &[fresh, repeat]);
        let merged: Vec<&str> = merged
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();

        assert_eq!(merged.len(), 5);
        assert_eq!(merged[0], fresh.to_string());
        assert_eq!(merged[1], old[2]);
        assert_eq!(merged[2], old[0]);
    }

    #[test]
    fn favorite_categories_tolerate_malformed_json() {
        let id = Uuid::new_v4();
        let merged = merge_favorite_categories(&json!({"not": "a list"}), &[id]);
        assert_eq!(merged, json!([id.to_string()]));
    }
}
