use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Stores {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Cameras {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ShoppingSessions {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum FaceRecognitionLogs {
    Table,
    Id,
    UserId,
    CameraId,
    StoreId,
    RecognitionType,
    Result,
    ConfidenceScore,
    SessionId,
    TransactionId,
    ProcessingTimeMs,
    ErrorMessage,
    Timestamp,
}

#[derive(DeriveIden)]
enum SecurityAlerts {
    Table,
    Id,
    AlertCode,
    AlertType,
    Severity,
    Status,
    UserId,
    StoreId,
    SessionId,
    TransactionId,
    Description,
    ResolutionNotes,
    AssignedToId,
    CreatedAt,
    ResolvedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    UserId,
    Action,
    ModelName,
    ObjectId,
    Changes,
    IpAddress,
    UserAgent,
    Timestamp,
}

#[derive(DeriveIden)]
enum DailySalesReports {
    Table,
    Id,
    StoreId,
    ReportDate,
    TotalTransactions,
    TotalRevenue,
    TotalVat,
    UniqueCustomers,
    NewCustomers,
    TotalItemsSold,
    AverageBasketSize,
    PaymentBreakdown,
    SuccessfulRecognitions,
    FailedRecognitions,
    AverageConfidence,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CustomerBehavior {
    Table,
    Id,
    UserId,
    TotalVisits,
    TotalPurchases,
    TotalSpent,
    FavoriteStoreId,
    FavoriteCategories,
    PreferredShoppingTime,
    AverageSessionDuration,
    LastVisit,
    LastPurchase,
    UpdatedAt,
}

fn now_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::cust("NOW()"))
        .to_owned()
}

fn amount<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .decimal_len(12, 2)
        .not_null()
        .default(Expr::cust("0.00"))
        .to_owned()
}

fn counter<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).integer().not_null().default(0).to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FaceRecognitionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FaceRecognitionLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FaceRecognitionLogs::UserId).uuid().null())
                    .col(ColumnDef::new(FaceRecognitionLogs::CameraId).uuid().null())
                    .col(ColumnDef::new(FaceRecognitionLogs::StoreId).uuid().not_null())
                    .col(
                        ColumnDef::new(FaceRecognitionLogs::RecognitionType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FaceRecognitionLogs::Result)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FaceRecognitionLogs::ConfidenceScore)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FaceRecognitionLogs::SessionId).uuid().null())
                    .col(
                        ColumnDef::new(FaceRecognitionLogs::TransactionId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FaceRecognitionLogs::ProcessingTimeMs)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FaceRecognitionLogs::ErrorMessage)
                            .text()
                            .null(),
                    )
                    .col(&mut now_column(FaceRecognitionLogs::Timestamp))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_face_logs_user")
                            .from(FaceRecognitionLogs::Table, FaceRecognitionLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_face_logs_camera")
                            .from(FaceRecognitionLogs::Table, FaceRecognitionLogs::CameraId)
                            .to(Cameras::Table, Cameras::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_face_logs_store")
                            .from(FaceRecognitionLogs::Table, FaceRecognitionLogs::StoreId)
                            .to(Stores::Table, Stores::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_face_logs_session")
                            .from(FaceRecognitionLogs::Table, FaceRecognitionLogs::SessionId)
                            .to(ShoppingSessions::Table, ShoppingSessions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_face_logs_transaction")
                            .from(
                                FaceRecognitionLogs::Table,
                                FaceRecognitionLogs::TransactionId,
                            )
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_face_logs_user_timestamp")
                    .table(FaceRecognitionLogs::Table)
                    .col(FaceRecognitionLogs::UserId)
                    .col(FaceRecognitionLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_face_logs_store_timestamp")
                    .table(FaceRecognitionLogs::Table)
                    .col(FaceRecognitionLogs::StoreId)
                    .col(FaceRecognitionLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SecurityAlerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SecurityAlerts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SecurityAlerts::AlertCode)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(SecurityAlerts::AlertType)
                            .string_len(30)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SecurityAlerts::Severity)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SecurityAlerts::Status)
                            .string_len(20)
                            .not_null()
                            .default("OPEN"),
                    )
                    .col(ColumnDef::new(SecurityAlerts::UserId).uuid().null())
                    .col(ColumnDef::new(SecurityAlerts::StoreId).uuid().not_null())
                    .col(ColumnDef::new(SecurityAlerts::SessionId).uuid().null())
                    .col(ColumnDef::new(SecurityAlerts::TransactionId).uuid().null())
                    .col(ColumnDef::new(SecurityAlerts::Description).text().not_null())
                    .col(
                        ColumnDef::new(SecurityAlerts::ResolutionNotes)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(SecurityAlerts::AssignedToId).uuid().null())
                    .col(&mut now_column(SecurityAlerts::CreatedAt))
                    .col(
                        ColumnDef::new(SecurityAlerts::ResolvedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut now_column(SecurityAlerts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_security_alerts_user")
                            .from(SecurityAlerts::Table, SecurityAlerts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_security_alerts_store")
                            .from(SecurityAlerts::Table, SecurityAlerts::StoreId)
                            .to(Stores::Table, Stores::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_security_alerts_session")
                            .from(SecurityAlerts::Table, SecurityAlerts::SessionId)
                            .to(ShoppingSessions::Table, ShoppingSessions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_security_alerts_transaction")
                            .from(SecurityAlerts::Table, SecurityAlerts::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_security_alerts_assignee")
                            .from(SecurityAlerts::Table, SecurityAlerts::AssignedToId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_security_alerts_status_severity")
                    .table(SecurityAlerts::Table)
                    .col(SecurityAlerts::Status)
                    .col(SecurityAlerts::Severity)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuditLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(AuditLogs::UserId).uuid().null())
                    .col(ColumnDef::new(AuditLogs::Action).string_len(20).not_null())
                    .col(ColumnDef::new(AuditLogs::ModelName).string_len(100).not_null())
                    .col(ColumnDef::new(AuditLogs::ObjectId).string_len(255).null())
                    .col(ColumnDef::new(AuditLogs::Changes).json_binary().null())
                    .col(ColumnDef::new(AuditLogs::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(AuditLogs::UserAgent).text().null())
                    .col(&mut now_column(AuditLogs::Timestamp))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_audit_logs_user")
                            .from(AuditLogs::Table, AuditLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_audit_logs_model_object")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::ModelName)
                    .col(AuditLogs::ObjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DailySalesReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DailySalesReports::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DailySalesReports::StoreId).uuid().not_null())
                    .col(ColumnDef::new(DailySalesReports::ReportDate).date().not_null())
                    .col(&mut counter(DailySalesReports::TotalTransactions))
                    .col(&mut amount(DailySalesReports::TotalRevenue))
                    .col(&mut amount(DailySalesReports::TotalVat))
                    .col(&mut counter(DailySalesReports::UniqueCustomers))
                    .col(&mut counter(DailySalesReports::NewCustomers))
                    .col(&mut counter(DailySalesReports::TotalItemsSold))
                    .col(&mut amount(DailySalesReports::AverageBasketSize))
                    .col(
                        ColumnDef::new(DailySalesReports::PaymentBreakdown)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(&mut counter(DailySalesReports::SuccessfulRecognitions))
                    .col(&mut counter(DailySalesReports::FailedRecognitions))
                    .col(
                        ColumnDef::new(DailySalesReports::AverageConfidence)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(Expr::cust("0.00")),
                    )
                    .col(&mut now_column(DailySalesReports::CreatedAt))
                    .col(&mut now_column(DailySalesReports::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_daily_sales_reports_store")
                            .from(DailySalesReports::Table, DailySalesReports::StoreId)
                            .to(Stores::Table, Stores::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_daily_sales_reports_store_date")
                    .table(DailySalesReports::Table)
                    .col(DailySalesReports::StoreId)
                    .col(DailySalesReports::ReportDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CustomerBehavior::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerBehavior::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CustomerBehavior::UserId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(&mut counter(CustomerBehavior::TotalVisits))
                    .col(&mut counter(CustomerBehavior::TotalPurchases))
                    .col(&mut amount(CustomerBehavior::TotalSpent))
                    .col(ColumnDef::new(CustomerBehavior::FavoriteStoreId).uuid().null())
                    .col(
                        ColumnDef::new(CustomerBehavior::FavoriteCategories)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(CustomerBehavior::PreferredShoppingTime)
                            .string_len(20)
                            .null(),
                    )
                    .col(&mut counter(CustomerBehavior::AverageSessionDuration))
                    .col(
                        ColumnDef::new(CustomerBehavior::LastVisit)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CustomerBehavior::LastPurchase)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut now_column(CustomerBehavior::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_behavior_user")
                            .from(CustomerBehavior::Table, CustomerBehavior::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_behavior_store")
                            .from(CustomerBehavior::Table, CustomerBehavior::FavoriteStoreId)
                            .to(Stores::Table, Stores::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomerBehavior::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DailySalesReports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SecurityAlerts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FaceRecognitionLogs::Table).to_owned())
            .await?;
        Ok(())
    }
}
