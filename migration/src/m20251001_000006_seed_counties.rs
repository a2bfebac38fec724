use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Counties {
    Table,
    Name,
    Code,
}

const COUNTIES: [(&str, &str); 47] = [
    ("Mombasa", "001"),
    ("Kwale", "002"),
    ("Kilifi", "003"),
    ("Tana River", "004"),
    ("Lamu", "005"),
    ("Taita-Taveta", "006"),
    ("Garissa", "007"),
    ("Wajir", "008"),
    ("Mandera", "009"),
    ("Marsabit", "010"),
    ("Isiolo", "011"),
    ("Meru", "012"),
    ("Tharaka-Nithi", "013"),
    ("Embu", "014"),
    ("Kitui", "015"),
    ("Machakos", "016"),
    ("Makueni", "017"),
    ("Nyandarua", "018"),
    ("Nyeri", "019"),
    ("Kirinyaga", "020"),
    ("Murang'a", "021"),
    ("Kiambu", "022"),
    ("Turkana", "023"),
    ("West Pokot", "024"),
    ("Samburu", "025"),
    ("Trans-Nzoia", "026"),
    ("Uasin Gishu", "027"),
    ("Elgeyo-Marakwet", "028"),
    ("Nandi", "029"),
    ("Baringo", "030"),
    ("Laikipia", "031"),
    ("Nakuru", "032"),
    ("Narok", "033"),
    ("Kajiado", "034"),
    ("Kericho", "035"),
    ("Bomet", "036"),
    ("Kakamega", "037"),
    ("Vihiga", "038"),
    ("Bungoma", "039"),
    ("Busia", "040"),
    ("Siaya", "041"),
    ("Kisumu", "042"),
    ("Homa Bay", "043"),
    ("Migori", "044"),
    ("Kisii", "045"),
    ("Nyamira", "046"),
    ("Nairobi", "047"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert
            .into_table(Counties::Table)
            .columns([Counties::Name, Counties::Code]);
        for (name, code) in COUNTIES {
            insert.values_panic([name.into(), code.into()]);
        }
        insert.on_conflict(OnConflict::column(Counties::Code).do_nothing().to_owned());
        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Counties::Table)
            .and_where(Expr::col(Counties::Code).is_in(COUNTIES.iter().map(|(_, code)| *code)))
            .to_owned();
        manager.exec_stmt(delete).await
    }
}
