//! Create `car_model` reference table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CarModel::Table)
                    .if_not_exists()
                    .col(uuid(CarModel::Id).primary_key())
                    .col(string_len(CarModel::Make, 50).not_null())
                    .col(string_len(CarModel::Model, 50).not_null())
                    .col(string_len_null(CarModel::Engine, 50))
                    .col(integer_null(CarModel::Year))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CarModel::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum CarModel { Table, Id, Make, Model, Engine, Year }
