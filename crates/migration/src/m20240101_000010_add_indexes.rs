use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Car: lookups by owner
        manager
            .create_index(
                Index::create()
                    .name("idx_car_client")
                    .table(Car::Table)
                    .col(Car::ClientId)
                    .to_owned(),
            )
            .await?;

        // Order: due_back and status are filtered on; (date, id) is the default ordering
        manager
            .create_index(
                Index::create()
                    .name("idx_order_due_back")
                    .table(Order::Table)
                    .col(Order::DueBack)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_order_status")
                    .table(Order::Table)
                    .col(Order::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_order_date_id")
                    .table(Order::Table)
                    .col(Order::Date)
                    .col(Order::Id)
                    .to_owned(),
            )
            .await?;

        // OrderEntry: amount is summed per order
        manager
            .create_index(
                Index::create()
                    .name("idx_order_entry_order")
                    .table(OrderEntry::Table)
                    .col(OrderEntry::OrderId)
                    .to_owned(),
            )
            .await?;

        // OrderReview: listed per order, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_order_review_order_reviewed_at")
                    .table(OrderReview::Table)
                    .col(OrderReview::OrderId)
                    .col(OrderReview::ReviewedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_car_client").table(Car::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_order_due_back").table(Order::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_order_status").table(Order::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_order_date_id").table(Order::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_order_entry_order").table(OrderEntry::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_order_review_order_reviewed_at").table(OrderReview::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Car { Table, ClientId }

#[derive(DeriveIden)]
enum Order { Table, Id, Date, DueBack, Status }

#[derive(DeriveIden)]
enum OrderEntry { Table, OrderId }

#[derive(DeriveIden)]
enum OrderReview { Table, OrderId, ReviewedAt }
