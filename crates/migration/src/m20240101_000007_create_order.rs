//! Create `order` table.
//!
//! `status` is a small integer: 0 in a row, 1 working, 2 pending, 3 done, 7 cancelled.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Order::Table)
                    .if_not_exists()
                    .col(uuid(Order::Id).primary_key())
                    .col(date(Order::Date).not_null())
                    .col(date_null(Order::DueBack))
                    .col(small_integer(Order::Status).not_null().default(0))
                    .col(uuid(Order::CarId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_car")
                            .from(Order::Table, Order::CarId)
                            .to(Car::Table, Car::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Order::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Order { Table, Id, Date, DueBack, Status, CarId }

#[derive(DeriveIden)]
enum Car { Table, Id }
