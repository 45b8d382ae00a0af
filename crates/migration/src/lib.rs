//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_user;
mod m20240101_000002_create_user_credentials;
mod m20240101_000003_create_user_profile;
mod m20240101_000004_create_car_model;
mod m20240101_000005_create_car;
mod m20240101_000006_create_service;
mod m20240101_000007_create_order;
mod m20240101_000008_create_order_entry;
mod m20240101_000009_create_order_review;
mod m20240101_000010_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_user::Migration),
            Box::new(m20240101_000002_create_user_credentials::Migration),
            Box::new(m20240101_000003_create_user_profile::Migration),
            Box::new(m20240101_000004_create_car_model::Migration),
            Box::new(m20240101_000005_create_car::Migration),
            Box::new(m20240101_000006_create_service::Migration),
            Box::new(m20240101_000007_create_order::Migration),
            Box::new(m20240101_000008_create_order_entry::Migration),
            Box::new(m20240101_000009_create_order_review::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000010_add_indexes::Migration),
        ]
    }
}
