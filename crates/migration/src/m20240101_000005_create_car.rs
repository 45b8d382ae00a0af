//! Create `car` table.
//!
//! Deleting a car model nulls `car_model_id`; deleting the client removes the car.
//! Plate number and VIN carry no unique constraint.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Car::Table)
                    .if_not_exists()
                    .col(uuid(Car::Id).primary_key())
                    .col(string_len(Car::PlateNr, 50).not_null())
                    .col(string_len(Car::Vin, 50).not_null())
                    .col(string_len_null(Car::Notes, 8000))
                    .col(string_len_null(Car::Cover, 255))
                    .col(uuid_null(Car::CarModelId))
                    .col(uuid_null(Car::ClientId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_car_car_model")
                            .from(Car::Table, Car::CarModelId)
                            .to(CarModel::Table, CarModel::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_car_client")
                            .from(Car::Table, Car::ClientId)
                            .to(AuthUser::Table, AuthUser::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Car::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Car { Table, Id, PlateNr, Vin, Notes, Cover, CarModelId, ClientId }

#[derive(DeriveIden)]
enum CarModel { Table, Id }

#[derive(DeriveIden)]
enum AuthUser { Table, Id }
