//! Create `user_profile` table (one-to-one with `auth_user`).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserProfile::Table)
                    .if_not_exists()
                    .col(uuid(UserProfile::Id).primary_key())
                    .col(uuid(UserProfile::UserId).unique_key().not_null())
                    .col(timestamp_with_time_zone(UserProfile::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_profile_user")
                            .from(UserProfile::Table, UserProfile::UserId)
                            .to(AuthUser::Table, AuthUser::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UserProfile::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum UserProfile { Table, Id, UserId, CreatedAt }

#[derive(DeriveIden)]
enum AuthUser { Table, Id }
