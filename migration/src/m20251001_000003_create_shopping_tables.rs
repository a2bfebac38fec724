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
enum Products {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum PaymentAccounts {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ShoppingSessions {
    Table,
    Id,
    SessionCode,
    UserId,
    StoreId,
    EntryTime,
    ExitTime,
    EntryCameraId,
    EntryFaceConfidence,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ShoppingCart {
    Table,
    Id,
    SessionId,
    ProductId,
    Quantity,
    UnitPrice,
    DetectedByCameraId,
    DetectionConfidence,
    AddedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TransactionCode,
    SessionId,
    UserId,
    StoreId,
    PaymentAccountId,
    PaymentMethod,
    Subtotal,
    VatAmount,
    DiscountAmount,
    TotalAmount,
    ProviderTransactionId,
    ProviderResponse,
    CheckoutCameraId,
    FaceRecognitionConfidence,
    Status,
    InitiatedAt,
    CompletedAt,
    ReceiptNumber,
    ReceiptUrl,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TransactionItems {
    Table,
    Id,
    TransactionId,
    ProductId,
    ProductName,
    Quantity,
    UnitPrice,
    VatRate,
    Subtotal,
    VatAmount,
    Total,
    CreatedAt,
}

fn timestamp_now<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::cust("NOW()"))
        .to_owned()
}

fn money<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).decimal_len(10, 2).not_null().to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShoppingSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShoppingSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ShoppingSessions::SessionCode)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ShoppingSessions::UserId).uuid().not_null())
                    .col(ColumnDef::new(ShoppingSessions::StoreId).uuid().not_null())
                    .col(&mut timestamp_now(ShoppingSessions::EntryTime))
                    .col(
                        ColumnDef::new(ShoppingSessions::ExitTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ShoppingSessions::EntryCameraId).uuid().null())
                    .col(
                        ColumnDef::new(ShoppingSessions::EntryFaceConfidence)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShoppingSessions::Status)
                            .string_len(20)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(ColumnDef::new(ShoppingSessions::Notes).text().null())
                    .col(&mut timestamp_now(ShoppingSessions::CreatedAt))
                    .col(&mut timestamp_now(ShoppingSessions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopping_sessions_user")
                            .from(ShoppingSessions::Table, ShoppingSessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopping_sessions_store")
                            .from(ShoppingSessions::Table, ShoppingSessions::StoreId)
                            .to(Stores::Table, Stores::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopping_sessions_entry_camera")
                            .from(ShoppingSessions::Table, ShoppingSessions::EntryCameraId)
                            .to(Cameras::Table, Cameras::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_shopping_sessions_user_status")
                    .table(ShoppingSessions::Table)
                    .col(ShoppingSessions::UserId)
                    .col(ShoppingSessions::Status)
                    .to_owned(),
            )
            .await?;

        // At most one ACTIVE session per user. sea-query has no partial index builder.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_shopping_sessions_one_active \
                 ON shopping_sessions (user_id) WHERE status = 'ACTIVE'",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ShoppingCart::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShoppingCart::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShoppingCart::SessionId).uuid().not_null())
                    .col(ColumnDef::new(ShoppingCart::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(ShoppingCart::Quantity)
                            .integer()
                            .not_null()
                            .default(1)
                            .check(Expr::col(ShoppingCart::Quantity).gte(1)),
                    )
                    .col(&mut money(ShoppingCart::UnitPrice))
                    .col(
                        ColumnDef::new(ShoppingCart::DetectedByCameraId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ShoppingCart::DetectionConfidence)
                            .decimal_len(5, 2)
                            .null(),
                    )
                    .col(&mut timestamp_now(ShoppingCart::AddedAt))
                    .col(&mut timestamp_now(ShoppingCart::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopping_cart_session")
                            .from(ShoppingCart::Table, ShoppingCart::SessionId)
                            .to(ShoppingSessions::Table, ShoppingSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopping_cart_product")
                            .from(ShoppingCart::Table, ShoppingCart::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shopping_cart_camera")
                            .from(ShoppingCart::Table, ShoppingCart::DetectedByCameraId)
                            .to(Cameras::Table, Cameras::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // unique (session_id, product_id)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_shopping_cart_session_product")
                    .table(ShoppingCart::Table)
                    .col(ShoppingCart::SessionId)
                    .col(ShoppingCart::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Transactions::TransactionCode)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Transactions::SessionId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::StoreId).uuid().not_null())
                    .col(
                        ColumnDef::new(Transactions::PaymentAccountId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::PaymentMethod)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(&mut money(Transactions::Subtotal))
                    .col(&mut money(Transactions::VatAmount))
                    .col(
                        ColumnDef::new(Transactions::DiscountAmount)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(Expr::cust("0.00")),
                    )
                    .col(&mut money(Transactions::TotalAmount))
                    .col(
                        ColumnDef::new(Transactions::ProviderTransactionId)
                            .string_len(200)
                            .null(),
                    )
                    .col(ColumnDef::new(Transactions::ProviderResponse).text().null())
                    .col(ColumnDef::new(Transactions::CheckoutCameraId).uuid().null())
                    .col(
                        ColumnDef::new(Transactions::FaceRecognitionConfidence)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::Status)
                            .string_len(20)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(&mut timestamp_now(Transactions::InitiatedAt))
                    .col(
                        ColumnDef::new(Transactions::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::ReceiptNumber)
                            .string_len(100)
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Transactions::ReceiptUrl).string_len(200).null())
                    .col(ColumnDef::new(Transactions::Notes).text().null())
                    .col(&mut timestamp_now(Transactions::CreatedAt))
                    .col(&mut timestamp_now(Transactions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_session")
                            .from(Transactions::Table, Transactions::SessionId)
                            .to(ShoppingSessions::Table, ShoppingSessions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_user")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_store")
                            .from(Transactions::Table, Transactions::StoreId)
                            .to(Stores::Table, Stores::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_payment_account")
                            .from(Transactions::Table, Transactions::PaymentAccountId)
                            .to(PaymentAccounts::Table, PaymentAccounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_checkout_camera")
                            .from(Transactions::Table, Transactions::CheckoutCameraId)
                            .to(Cameras::Table, Cameras::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_user_initiated")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::InitiatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_status")
                    .table(Transactions::Table)
                    .col(Transactions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TransactionItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionItems::TransactionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionItems::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(TransactionItems::ProductName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionItems::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(TransactionItems::Quantity).gte(1)),
                    )
                    .col(&mut money(TransactionItems::UnitPrice))
                    .col(
                        ColumnDef::new(TransactionItems::VatRate)
                            .decimal_len(5, 2)
                            .not_null(),
                    )
                    .col(&mut money(TransactionItems::Subtotal))
                    .col(&mut money(TransactionItems::VatAmount))
                    .col(&mut money(TransactionItems::Total))
                    .col(&mut timestamp_now(TransactionItems::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_items_transaction")
                            .from(TransactionItems::Table, TransactionItems::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_items_product")
                            .from(TransactionItems::Table, TransactionItems::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransactionItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShoppingCart::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShoppingSessions::Table).to_owned())
            .await?;
        Ok(())
    }
}
