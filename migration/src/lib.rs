pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_identity_tables;
mod m20251001_000002_create_catalog_tables;
mod m20251001_000003_create_shopping_tables;
mod m20251001_000004_create_loyalty_tables;
mod m20251001_000005_create_observability_tables;
mod m20251001_000006_seed_counties;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_identity_tables::Migration),
            Box::new(m20251001_000002_create_catalog_tables::Migration),
            Box::new(m20251001_000003_create_shopping_tables::Migration),
            Box::new(m20251001_000004_create_loyalty_tables::Migration),
            Box::new(m20251001_000005_create_observability_tables::Migration),
            Box::new(m20251001_000006_seed_counties::Migration),
        ]
    }
}
