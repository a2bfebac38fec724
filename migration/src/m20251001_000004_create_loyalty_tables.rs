use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Promotions {
    Table,
    Id,
    Name,
    Code,
    Description,
    DiscountType,
    DiscountValue,
    MinimumPurchase,
    MaximumDiscount,
    StartDate,
    EndDate,
    IsActive,
    UsageLimit,
    UsagePerCustomer,
    TimesUsed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LoyaltyPrograms {
    Table,
    Id,
    UserId,
    TotalPointsEarned,
    TotalPointsRedeemed,
    CurrentBalance,
    CurrentTier,
    MemberSince,
    LastActivity,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LoyaltyTransactions {
    Table,
    Id,
    LoyaltyProgramId,
    TransactionType,
    Points,
    BalanceAfter,
    RelatedTransactionId,
    Description,
    ExpiresAt,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Promotions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Promotions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Promotions::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Promotions::Code)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Promotions::Description).text().not_null())
                    .col(
                        ColumnDef::new(Promotions::DiscountType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Promotions::DiscountValue)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Promotions::MinimumPurchase)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(Expr::cust("0.00")),
                    )
                    .col(
                        ColumnDef::new(Promotions::MaximumDiscount)
                            .decimal_len(10, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Promotions::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Promotions::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Promotions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Promotions::UsageLimit).integer().null())
                    .col(
                        ColumnDef::new(Promotions::UsagePerCustomer)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Promotions::TimesUsed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Promotions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Promotions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LoyaltyPrograms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoyaltyPrograms::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPrograms::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPrograms::TotalPointsEarned)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPrograms::TotalPointsRedeemed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPrograms::CurrentBalance)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPrograms::CurrentTier)
                            .string_len(10)
                            .not_null()
                            .default("BRONZE"),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPrograms::MemberSince)
                            .date()
                            .not_null()
                            .default(Expr::cust("CURRENT_DATE")),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPrograms::LastActivity)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPrograms::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPrograms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(LoyaltyPrograms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loyalty_programs_user")
                            .from(LoyaltyPrograms::Table, LoyaltyPrograms::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LoyaltyTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoyaltyTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::LoyaltyProgramId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::TransactionType)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::Points)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::BalanceAfter)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::RelatedTransactionId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoyaltyTransactions::Description)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LoyaltyTransactions::ExpiresAt).date().null())
                    .col(
                        ColumnDef::new(LoyaltyTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loyalty_transactions_program")
                            .from(
                                LoyaltyTransactions::Table,
                                LoyaltyTransactions::LoyaltyProgramId,
                            )
                            .to(LoyaltyPrograms::Table, LoyaltyPrograms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loyalty_transactions_related")
                            .from(
                                LoyaltyTransactions::Table,
                                LoyaltyTransactions::RelatedTransactionId,
                            )
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LoyaltyTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoyaltyPrograms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Promotions::Table).to_owned())
            .await?;
        Ok(())
    }
}
