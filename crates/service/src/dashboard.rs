use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use tracing::instrument;

use models::{car, order, service};

use crate::errors::ServiceError;

/// Front page counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub service_count: u64,
    /// Orders with status `Done`.
    pub count_orders: u64,
    pub count_cars: u64,
}

#[instrument(skip(db))]
pub async fn counts(db: &DatabaseConnection) -> Result<DashboardCounts, ServiceError> {
    let service_count = service::Entity::find().count(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    let count_orders = order::Entity::find()
        .filter(order::Column::Status.eq(order::OrderStatus::Done))
        .count(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let count_cars = car::Entity::find().count(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(DashboardCounts { service_count, count_orders, count_cars })
}
