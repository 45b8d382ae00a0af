//! Create `order_entry` table (order line items).
//!
//! `price` is a legacy stored override kept for compatibility; reads derive the
//! line price from the service.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderEntry::Table)
                    .if_not_exists()
                    .col(uuid(OrderEntry::Id).primary_key())
                    .col(integer(OrderEntry::Quantity).not_null())
                    .col(decimal_len(OrderEntry::Price, 18, 2).not_null().default(0))
                    .col(uuid(OrderEntry::ServiceId).not_null())
                    .col(uuid(OrderEntry::OrderId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_entry_service")
                            .from(OrderEntry::Table, OrderEntry::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_entry_order")
                            .from(OrderEntry::Table, OrderEntry::OrderId)
                            .to(Order::Table, Order::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OrderEntry::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum OrderEntry { Table, Id, Quantity, Price, ServiceId, OrderId }

#[derive(DeriveIden)]
enum Service { Table, Id }

#[derive(DeriveIden)]
enum Order { Table, Id }
