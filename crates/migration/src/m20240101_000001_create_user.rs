//! Create `auth_user` table.
//!
//! Shop clients and staff share one account table; `is_staff` gates admin endpoints.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthUser::Table)
                    .if_not_exists()
                    .col(uuid(AuthUser::Id).primary_key())
                    .col(string_len(AuthUser::Username, 150).unique_key().not_null())
                    .col(string_len(AuthUser::FirstName, 150).not_null())
                    .col(string_len(AuthUser::LastName, 150).not_null())
                    .col(string_len(AuthUser::Email, 254).not_null())
                    .col(boolean(AuthUser::IsStaff).not_null().default(false))
                    .col(boolean(AuthUser::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(AuthUser::DateJoined).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AuthUser::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AuthUser { Table, Id, Username, FirstName, LastName, Email, IsStaff, IsActive, DateJoined }
