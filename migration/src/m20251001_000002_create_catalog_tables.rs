use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Counties {
    Table,
    Id,
    Name,
    Code,
}

#[derive(DeriveIden)]
enum Stores {
    Table,
    Id,
    Name,
    StoreCode,
    StoreType,
    CountyId,
    Address,
    Latitude,
    Longitude,
    PhoneNumber,
    Email,
    OpeningTime,
    ClosingTime,
    #[sea_orm(iden = "is_24_hours")]
    Is24Hours,
    IsActive,
    DateOpened,
    ManagerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Cameras {
    Table,
    Id,
    StoreId,
    CameraCode,
    CameraType,
    IpAddress,
    Port,
    StreamUrl,
    LocationDescription,
    Zone,
    IsActive,
    IsOnline,
    LastPing,
    InstallationDate,
    LastMaintenance,
    NextMaintenance,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProductCategories {
    Table,
    Id,
    Name,
    Slug,
    Description,
    ParentId,
    IsActive,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    Slug,
    Description,
    CategoryId,
    Barcode,
    Sku,
    Price,
    CostPrice,
    VatRate,
    Brand,
    Manufacturer,
    CountryOfOrigin,
    Weight,
    Dimensions,
    VisualSignature,
    IsActive,
    IsFeatured,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StoreInventory {
    Table,
    Id,
    StoreId,
    ProductId,
    Quantity,
    ReorderLevel,
    MaxStockLevel,
    ShelfLocation,
    Aisle,
    IsAvailable,
    LastRestocked,
    CreatedAt,
    UpdatedAt,
}

fn created_at<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::cust("NOW()"))
        .to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Counties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Counties::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Counties::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Counties::Code)
                            .string_len(10)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Stores::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stores::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Stores::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Stores::StoreCode)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Stores::StoreType).string_len(20).not_null())
                    .col(ColumnDef::new(Stores::CountyId).integer().not_null())
                    .col(ColumnDef::new(Stores::Address).text().not_null())
                    .col(ColumnDef::new(Stores::Latitude).decimal_len(9, 6).null())
                    .col(ColumnDef::new(Stores::Longitude).decimal_len(9, 6).null())
                    .col(ColumnDef::new(Stores::PhoneNumber).string_len(15).not_null())
                    .col(ColumnDef::new(Stores::Email).string_len(254).null())
                    .col(ColumnDef::new(Stores::OpeningTime).time().not_null())
                    .col(ColumnDef::new(Stores::ClosingTime).time().not_null())
                    .col(
                        ColumnDef::new(Stores::Is24Hours)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Stores::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Stores::DateOpened).date().not_null())
                    .col(ColumnDef::new(Stores::ManagerId).uuid().null())
                    .col(&mut created_at(Stores::CreatedAt))
                    .col(&mut created_at(Stores::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stores_county")
                            .from(Stores::Table, Stores::CountyId)
                            .to(Counties::Table, Counties::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stores_manager")
                            .from(Stores::Table, Stores::ManagerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cameras::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cameras::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Cameras::StoreId).uuid().not_null())
                    .col(
                        ColumnDef::new(Cameras::CameraCode)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Cameras::CameraType).string_len(20).not_null())
                    .col(ColumnDef::new(Cameras::IpAddress).string_len(45).not_null())
                    .col(
                        ColumnDef::new(Cameras::Port)
                            .integer()
                            .not_null()
                            .default(554),
                    )
                    .col(ColumnDef::new(Cameras::StreamUrl).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Cameras::LocationDescription)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Cameras::Zone).string_len(50).null())
                    .col(
                        ColumnDef::new(Cameras::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Cameras::IsOnline)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Cameras::LastPing)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Cameras::InstallationDate).date().not_null())
                    .col(ColumnDef::new(Cameras::LastMaintenance).date().null())
                    .col(ColumnDef::new(Cameras::NextMaintenance).date().null())
                    .col(&mut created_at(Cameras::CreatedAt))
                    .col(&mut created_at(Cameras::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cameras_store")
                            .from(Cameras::Table, Cameras::StoreId)
                            .to(Stores::Table, Stores::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductCategories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProductCategories::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductCategories::Slug)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ProductCategories::Description).text().null())
                    .col(ColumnDef::new(ProductCategories::ParentId).uuid().null())
                    .col(
                        ColumnDef::new(ProductCategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_categories_parent")
                            .from(ProductCategories::Table, ProductCategories::ParentId)
                            .to(ProductCategories::Table, ProductCategories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Products::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Products::Slug)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Products::Description).text().null())
                    .col(ColumnDef::new(Products::CategoryId).uuid().not_null())
                    .col(
                        ColumnDef::new(Products::Barcode)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Products::Sku)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Products::Price).decimal_len(10, 2).not_null())
                    .col(ColumnDef::new(Products::CostPrice).decimal_len(10, 2).null())
                    .col(
                        ColumnDef::new(Products::VatRate)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(Expr::cust("16.00")),
                    )
                    .col(ColumnDef::new(Products::Brand).string_len(100).null())
                    .col(ColumnDef::new(Products::Manufacturer).string_len(200).null())
                    .col(
                        ColumnDef::new(Products::CountryOfOrigin)
                            .string_len(100)
                            .not_null()
                            .default("Kenya"),
                    )
                    .col(ColumnDef::new(Products::Weight).decimal_len(10, 3).null())
                    .col(ColumnDef::new(Products::Dimensions).string_len(100).null())
                    .col(ColumnDef::new(Products::VisualSignature).text().null())
                    .col(
                        ColumnDef::new(Products::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Products::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(&mut created_at(Products::CreatedAt))
                    .col(&mut created_at(Products::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_category")
                            .from(Products::Table, Products::CategoryId)
                            .to(ProductCategories::Table, ProductCategories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StoreInventory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StoreInventory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StoreInventory::StoreId).uuid().not_null())
                    .col(ColumnDef::new(StoreInventory::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(StoreInventory::Quantity)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(StoreInventory::Quantity).gte(0)),
                    )
                    .col(
                        ColumnDef::new(StoreInventory::ReorderLevel)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(StoreInventory::MaxStockLevel)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(StoreInventory::ShelfLocation)
                            .string_len(100)
                            .null(),
                    )
                    .col(ColumnDef::new(StoreInventory::Aisle).string_len(50).null())
                    .col(
                        ColumnDef::new(StoreInventory::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(StoreInventory::LastRestocked)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut created_at(StoreInventory::CreatedAt))
                    .col(&mut created_at(StoreInventory::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_store_inventory_store")
                            .from(StoreInventory::Table, StoreInventory::StoreId)
                            .to(Stores::Table, Stores::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_store_inventory_product")
                            .from(StoreInventory::Table, StoreInventory::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // unique (store_id, product_id)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_store_inventory_store_product")
                    .table(StoreInventory::Table)
                    .col(StoreInventory::StoreId)
                    .col(StoreInventory::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StoreInventory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cameras::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Stores::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Counties::Table).to_owned())
            .await?;
        Ok(())
    }
}
