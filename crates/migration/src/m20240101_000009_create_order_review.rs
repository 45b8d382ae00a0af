//! Create `order_review` table.
//!
//! Reviews go away with their order; a deleted reviewer leaves the review anonymous.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderReview::Table)
                    .if_not_exists()
                    .col(uuid(OrderReview::Id).primary_key())
                    .col(uuid(OrderReview::OrderId).not_null())
                    .col(uuid_null(OrderReview::ReviewerId))
                    .col(timestamp_with_time_zone(OrderReview::ReviewedAt).not_null())
                    .col(string_len(OrderReview::Content, 4000).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_review_order")
                            .from(OrderReview::Table, OrderReview::OrderId)
                            .to(Order::Table, Order::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_review_reviewer")
                            .from(OrderReview::Table, OrderReview::ReviewerId)
                            .to(AuthUser::Table, AuthUser::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OrderReview::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum OrderReview { Table, Id, OrderId, ReviewerId, ReviewedAt, Content }

#[derive(DeriveIden)]
enum Order { Table, Id }

#[derive(DeriveIden)]
enum AuthUser { Table, Id }
