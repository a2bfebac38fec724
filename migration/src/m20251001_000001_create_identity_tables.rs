use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PhoneNumber,
    PasswordHash,
    FirstName,
    LastName,
    IdNumber,
    DateOfBirth,
    Gender,
    IsVerified,
    KycVerified,
    IsStaff,
    IsSuperuser,
    IsActive,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FacialData {
    Table,
    Id,
    UserId,
    FaceEncoding,
    RegistrationDate,
    LastUpdated,
    IsActive,
    ConfidenceThreshold,
    FailedRecognitionAttempts,
    LastRecognitionAttempt,
    IsLocked,
}

#[derive(DeriveIden)]
enum PaymentAccounts {
    Table,
    Id,
    UserId,
    PaymentMethod,
    AccountNumber,
    AccountName,
    ProviderReference,
    IsPrimary,
    IsVerified,
    IsActive,
    DailyLimit,
    TransactionLimit,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(254)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::PhoneNumber)
                            .string_len(15)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Users::FirstName)
                            .string_len(150)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Users::LastName)
                            .string_len(150)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Users::IdNumber)
                            .string_len(20)
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::DateOfBirth).date().null())
                    .col(ColumnDef::new(Users::Gender).string_len(1).null())
                    .col(
                        ColumnDef::new(Users::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::KycVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::IsStaff)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::IsSuperuser)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::LastLogin)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
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
                    .table(FacialData::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FacialData::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(FacialData::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(FacialData::FaceEncoding).text().not_null())
                    .col(
                        ColumnDef::new(FacialData::RegistrationDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(FacialData::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(FacialData::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(FacialData::ConfidenceThreshold)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(Expr::cust("95.00")),
                    )
                    .col(
                        ColumnDef::new(FacialData::FailedRecognitionAttempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FacialData::LastRecognitionAttempt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FacialData::IsLocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_facial_data_user")
                            .from(FacialData::Table, FacialData::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentAccounts::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(PaymentAccounts::PaymentMethod)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentAccounts::AccountNumber)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentAccounts::AccountName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentAccounts::ProviderReference)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaymentAccounts::IsPrimary)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PaymentAccounts::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PaymentAccounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PaymentAccounts::DailyLimit)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(Expr::cust("50000.00")),
                    )
                    .col(
                        ColumnDef::new(PaymentAccounts::TransactionLimit)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(Expr::cust("10000.00")),
                    )
                    .col(
                        ColumnDef::new(PaymentAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(PaymentAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_accounts_user")
                            .from(PaymentAccounts::Table, PaymentAccounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // unique (user_id, account_number)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_payment_accounts_user_account")
                    .table(PaymentAccounts::Table)
                    .col(PaymentAccounts::UserId)
                    .col(PaymentAccounts::AccountNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FacialData::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
