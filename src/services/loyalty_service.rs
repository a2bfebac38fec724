use crate::entities::{
    AuditAction, LoyaltyTier, LoyaltyTransactionType, loyalty_program_entity as programs,
    loyalty_transaction_entity as ledger,
};
use crate::error::{AppError, AppResult};
use crate::models::{LoyaltyDashboard, RedeemPointsRequest, RedeemPointsResponse};
use crate::services::audit_service::{self, AuditEntry};
use crate::utils::RequestContext;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

const RECENT_ENTRIES: u64 = 10;

/// Lifetime points above which each tier starts. One point is one shilling spent.
const SILVER_ABOVE: i32 = 10_000;
const GOLD_ABOVE: i32 = 25_000;
const PLATINUM_ABOVE: i32 = 50_000;

pub fn tier_for(lifetime_points: i32) -> LoyaltyTier {
    if lifetime_points > PLATINUM_ABOVE {
        LoyaltyTier::Platinum
    } else if lifetime_points > GOLD_ABOVE {
        LoyaltyTier::Gold
    } else if lifetime_points > SILVER_ABOVE {
        LoyaltyTier::Silver
    } else {
        LoyaltyTier::Bronze
    }
}

/// Balance arithmetic for a loyalty account. The balance is never stored on
/// its own; it is always derived from what was earned and redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsBalance {
    pub earned: i32,
    pub redeemed: i32,
}

impl PointsBalance {
    pub fn current(&self) -> i32 {
        self.earned - self.redeemed
    }

    pub fn redeem(self, points: i32) -> AppResult<Self> {
        if points <= 0 {
            return Err(AppError::ValidationError(
                "Points to redeem must be positive".to_string(),
            ));
        }
        if points > self.current() {
            return Err(AppError::ValidationError(
                "Insufficient points balance".to_string(),
            ));
        }
        Ok(Self {
            redeemed: self.redeemed + points,
            ..self
        })
    }
}

impl From<&programs::Model> for PointsBalance {
    fn from(program: &programs::Model) -> Self {
        Self {
            earned: program.total_points_earned,
            redeemed: program.total_points_redeemed,
        }
    }
}

/// Loads the user's program, enrolling them on first use.
pub async fn get_or_create<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<programs::Model, DbErr> {
    let find = programs::Entity::find().filter(programs::Column::UserId.eq(user_id));
    if let Some(program) = find.clone().one(db).await? {
        return Ok(program);
    }

    let now = Utc::now();
    let row = programs::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total_points_earned: Set(0),
        total_points_redeemed: Set(0),
        current_balance: Set(0),
        current_tier: Set(LoyaltyTier::Bronze),
        member_since: Set(now.date_naive()),
        last_activity: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    // A concurrent first visit may have enrolled the user already.
    programs::Entity::insert(row)
        .on_conflict(
            OnConflict::column(programs::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    find.one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("loyalty program".to_string()))
}

/// A ledger line to append alongside a balance change.
#[derive(Debug, Clone)]
pub struct PointsMovement {
    pub points: i32,
    pub related_transaction_id: Option<Uuid>,
    pub description: String,
    pub expires_at: Option<NaiveDate>,
}

async fn append_entry<C: ConnectionTrait>(
    db: &C,
    program: &programs::Model,
    kind: LoyaltyTransactionType,
    movement: PointsMovement,
) -> Result<ledger::Model, DbErr> {
    let entry = ledger::Model {
        id: Uuid::new_v4(),
        loyalty_program_id: program.id,
        transaction_type: kind,
        points: movement.points,
        balance_after: program.current_balance,
        related_transaction_id: movement.related_transaction_id,
        description: movement.description,
        expires_at: movement.expires_at,
        created_at: Utc::now(),
    };
    let row = ledger::ActiveModel {
        id: Set(entry.id),
        loyalty_program_id: Set(entry.loyalty_program_id),
        transaction_type: Set(entry.transaction_type),
        points: Set(entry.points),
        balance_after: Set(entry.balance_after),
        related_transaction_id: Set(entry.related_transaction_id),
        description: Set(entry.description.clone()),
        expires_at: Set(entry.expires_at),
        created_at: Set(entry.created_at),
    };
    ledger::Entity::insert(row).exec_without_returning(db).await?;
    Ok(entry)
}

/// Credits points to the user's program, moves it up a tier when lifetime
/// points cross a threshold, and appends an EARN entry.
pub async fn earn_points<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    movement: PointsMovement,
) -> Result<(programs::Model, ledger::Model), DbErr> {
    let program = get_or_create(db, user_id).await?;
    let now = Utc::now();
    let points = movement.points;

    let updated = programs::Entity::update_many()
        .col_expr(
            programs::Column::TotalPointsEarned,
            Expr::col(programs::Column::TotalPointsEarned).add(points),
        )
        .col_expr(
            programs::Column::CurrentBalance,
            Expr::col(programs::Column::CurrentBalance).add(points),
        )
        .col_expr(programs::Column::LastActivity, Expr::value(Some(now)))
        .col_expr(programs::Column::UpdatedAt, Expr::value(now))
        .filter(programs::Column::Id.eq(program.id))
        .exec_with_returning(db)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DbErr::RecordNotFound("loyalty program".to_string()))?;

    let tier = tier_for(updated.total_points_earned);
    let updated = if tier == updated.current_tier {
        updated
    } else {
        log::info!(
            "User {user_id} moved from {:?} to {tier:?}",
            updated.current_tier
        );
        let mut am = updated.into_active_model();
        am.current_tier = Set(tier);
        am.update(db).await?
    };

    let entry = append_entry(db, &updated, LoyaltyTransactionType::Earn, movement).await?;
    Ok((updated, entry))
}

#[derive(Clone)]
pub struct LoyaltyService {
    pool: Arc<DatabaseConnection>,
}

impl LoyaltyService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    pub async fn dashboard(&self, user_id: Uuid) -> AppResult<LoyaltyDashboard> {
        let program = get_or_create(self.pool.as_ref(), user_id).await?;
        let recent_transactions = ledger::Entity::find()
            .filter(ledger::Column::LoyaltyProgramId.eq(program.id))
            .order_by_desc(ledger::Column::CreatedAt)
            .limit(RECENT_ENTRIES)
            .all(self.pool.as_ref())
            .await?;
        Ok(LoyaltyDashboard {
            program,
            recent_transactions,
        })
    }

    pub async fn redeem(
        &self,
        user_id: Uuid,
        request: RedeemPointsRequest,
        ctx: &RequestContext,
    ) -> AppResult<RedeemPointsResponse> {
        let txn = self.pool.begin().await?;
        let program = get_or_create(&txn, user_id).await?;

        // Validates against the balance we just read; the guarded update below
        // re-checks it against the row.
        PointsBalance::from(&program).redeem(request.points)?;
        let points = request.points;

        let updated = programs::Entity::update_many()
            .col_expr(
                programs::Column::TotalPointsRedeemed,
                Expr::col(programs::Column::TotalPointsRedeemed).add(points),
            )
            .col_expr(
                programs::Column::CurrentBalance,
                Expr::col(programs::Column::CurrentBalance).sub(points),
            )
            .col_expr(programs::Column::LastActivity, Expr::value(Some(Utc::now())))
            .col_expr(programs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(programs::Column::Id.eq(program.id))
            .filter(programs::Column::CurrentBalance.gte(points))
            .exec_with_returning(&txn)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ValidationError("Insufficient points balance".to_string()))?;

        let entry = append_entry(
            &txn,
            &updated,
            LoyaltyTransactionType::Redeem,
            PointsMovement {
                points,
                related_transaction_id: None,
                description: request
                    .description
                    .unwrap_or_else(|| "Points redeemed".to_string()),
                expires_at: None,
            },
        )
        .await?;

        audit_service::record(
            &txn,
            AuditEntry::new(Some(user_id), AuditAction::Update, "LoyaltyProgram")
                .object(updated.id),
            ctx,
        )
        .await?;

        txn.commit().await?;
        log::info!("User {user_id} redeemed {points} points");

        Ok(RedeemPointsResponse {
            current_balance: updated.current_balance,
            entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mock::exec_ok;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn program(user_id: Uuid, earned: i32, redeemed: i32) -> programs::Model {
        let now = Utc::now();
        programs::Model {
            id: Uuid::new_v4(),
            user_id,
            total_points_earned: earned,
            total_points_redeemed: redeemed,
            current_balance: earned - redeemed,
            current_tier: LoyaltyTier::Bronze,
            member_since: now.date_naive(),
            last_activity: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn balance_is_earned_minus_redeemed() {
        let balance = PointsBalance::from(&program(Uuid::new_v4(), 620, 0));
        let balance = balance.redeem(200).unwrap();
        assert_eq!(balance.current(), 420);
        assert_eq!(balance.earned - balance.redeemed, balance.current());
    }

    #[test]
    fn tiers_follow_lifetime_points() {
        assert_eq!(tier_for(0), LoyaltyTier::Bronze);
        assert_eq!(tier_for(10_000), LoyaltyTier::Bronze);
        assert_eq!(tier_for(10_001), LoyaltyTier::Silver);
        assert_eq!(tier_for(25_001), LoyaltyTier::Gold);
        assert_eq!(tier_for(50_001), LoyaltyTier::Platinum);
    }

    #[test]
    fn redeem_rejects_non_positive_and_overdraw() {
        let balance = PointsBalance {
            earned: 100,
            redeemed: 0,
        };
        assert!(balance.redeem(0).is_err());
        assert!(balance.redeem(-5).is_err());
        assert!(balance.redeem(101).is_err());
        assert_eq!(balance.redeem(100).unwrap().current(), 0);
    }

    #[actix_web::test]
    async fn get_or_create_returns_existing_program_without_insert() {
        let user_id = Uuid::new_v4();
        let existing = program(user_id, 50, 0);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .into_connection();
        let found = get_or_create(&db, user_id).await.unwrap();
        assert_eq!(found, existing);
    }

    #[actix_web::test]
    async fn earn_points_returns_entry_with_new_balance() {
        let user_id = Uuid::new_v4();
        let before = program(user_id, 100, 40);
        let mut after = before.clone();
        after.total_points_earned = 350;
        after.current_balance = 310;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![before]])
            .append_query_results([vec![after.clone()]])
            .append_exec_results([exec_ok()])
            .into_connection();

        let (updated, entry) = earn_points(
            &db,
            user_id,
            PointsMovement {
                points: 250,
                related_transaction_id: None,
                description: "Earned from purchase at Westlands".into(),
                expires_at: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.current_balance, 310);
        assert_eq!(entry.balance_after, 310);
        assert_eq!(entry.transaction_type, LoyaltyTransactionType::Earn);
        assert_eq!(
            updated.current_balance,
            updated.total_points_earned - updated.total_points_redeemed
        );
    }

    #[actix_web::test]
    async fn redeem_more_than_balance_is_rejected_before_writing() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![program(user_id, 100, 90)]])
            .into_connection();
        let svc = LoyaltyService::new(Arc::new(db));
        let err = svc
            .redeem(
                user_id,
                RedeemPointsRequest {
                    points: 11,
                    description: None,
                },
                &RequestContext::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[actix_web::test]
    async fn crossing_a_threshold_promotes_the_tier() {
        let user_id = Uuid::new_v4();
        let before = program(user_id, 9_800, 0);
        let mut credited = before.clone();
        credited.total_points_earned = 10_400;
        credited.current_balance = 10_400;
        let mut promoted = credited.clone();
        promoted.current_tier = LoyaltyTier::Silver;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![before]])
            .append_query_results([vec![credited]])
            .append_query_results([vec![promoted]])
            .append_exec_results([exec_ok()])
            .into_connection();

        let (updated, entry) = earn_points(
            &db,
            user_id,
            PointsMovement {
                points: 600,
                related_transaction_id: None,
                description: "Earned from purchase at Westlands".into(),
                expires_at: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.current_tier, LoyaltyTier::Silver);
        assert_eq!(entry.balance_after, 10_400);
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("SILVER"));
    }
}
