//! Staff maintenance of car models, services, order entries and order
//! status. Every call checks the staff flag first.

use sea_orm::{DatabaseConnection, EntityTrait, ModelTrait, QueryOrder};
use tracing::{info, instrument};
use uuid::Uuid;

use models::order::OrderStatus;
use models::{car_model, order, order_entry, service};

use crate::errors::ServiceError;
use crate::order_service::{self, EntryView};
use crate::policy::{require_staff, Requester};

pub async fn list_car_models(db: &DatabaseConnection, requester: &Requester) -> Result<Vec<car_model::Model>, ServiceError> {
    require_staff(requester)?;
    car_model::Entity::find()
        .order_by_asc(car_model::Column::Make)
        .order_by_asc(car_model::Column::Model)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

#[instrument(skip(db, input), fields(user_id = %requester.id))]
pub async fn create_car_model(db: &DatabaseConnection, requester: &Requester, input: car_model::CarModelInput) -> Result<car_model::Model, ServiceError> {
    require_staff(requester)?;
    let created = car_model::create(db, input).await?;
    info!(car_model_id = %created.id, "car_model_created");
    Ok(created)
}

pub async fn update_car_model(
    db: &DatabaseConnection,
    requester: &Requester,
    id: Uuid,
    input: car_model::CarModelInput,
) -> Result<car_model::Model, ServiceError> {
    require_staff(requester)?;
    let existing = car_model::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("car model"))?;
    Ok(car_model::update(db, existing, input).await?)
}

/// Cars of the deleted model keep existing with no model.
pub async fn delete_car_model(db: &DatabaseConnection, requester: &Requester, id: Uuid) -> Result<(), ServiceError> {
    require_staff(requester)?;
    let res = car_model::Entity::delete_by_id(id).exec(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("car model"));
    }
    Ok(())
}

pub async fn list_services(db: &DatabaseConnection, requester: &Requester) -> Result<Vec<service::Model>, ServiceError> {
    require_staff(requester)?;
    service::Entity::find()
        .order_by_asc(service::Column::Name)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

#[instrument(skip(db, input), fields(user_id = %requester.id))]
pub async fn create_service(db: &DatabaseConnection, requester: &Requester, input: service::ServiceInput) -> Result<service::Model, ServiceError> {
    require_staff(requester)?;
    let created = service::create(db, input).await?;
    info!(service_id = %created.id, "service_created");
    Ok(created)
}

pub async fn update_service(
    db: &DatabaseConnection,
    requester: &Requester,
    id: Uuid,
    input: service::ServiceInput,
) -> Result<service::Model, ServiceError> {
    require_staff(requester)?;
    let existing = service::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("service"))?;
    Ok(service::update(db, existing, input).await?)
}

/// Removes the service and every order entry that bills it.
#[instrument(skip(db), fields(user_id = %requester.id))]
pub async fn delete_service(db: &DatabaseConnection, requester: &Requester, id: Uuid) -> Result<(), ServiceError> {
    require_staff(requester)?;
    let existing = service::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("service"))?;
    existing.delete(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(service_id = %id, "service_deleted");
    Ok(())
}

#[instrument(skip(db), fields(user_id = %requester.id))]
pub async fn set_order_status(
    db: &DatabaseConnection,
    requester: &Requester,
    order_id: Uuid,
    status: OrderStatus,
) -> Result<order::Model, ServiceError> {
    require_staff(requester)?;
    let (existing, _) = order_service::find_order(db, order_id).await?;
    let updated = order::set_status(db, existing, status).await?;
    info!(order_id = %order_id, status = status.code(), "order_status_set");
    Ok(updated)
}

pub async fn list_entries(db: &DatabaseConnection, requester: &Requester, order_id: Uuid) -> Result<Vec<EntryView>, ServiceError> {
    require_staff(requester)?;
    order_service::find_order(db, order_id).await?;
    Ok(order_service::load_entries(db, order_id).await?.into_iter().map(EntryView::from).collect())
}

#[instrument(skip(db, input), fields(user_id = %requester.id))]
pub async fn add_entry(
    db: &DatabaseConnection,
    requester: &Requester,
    order_id: Uuid,
    input: order_entry::EntryInput,
) -> Result<order_entry::Model, ServiceError> {
    require_staff(requester)?;
    order_service::find_order(db, order_id).await?;
    service::Entity::find_by_id(input.service_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("service"))?;
    let created = order_entry::create(db, order_id, input).await?;
    info!(entry_id = %created.id, order_id = %order_id, "order_entry_added");
    Ok(created)
}

pub async fn delete_entry(db: &DatabaseConnection, requester: &Requester, entry_id: Uuid) -> Result<(), ServiceError> {
    require_staff(requester)?;
    let res = order_entry::Entity::delete_by_id(entry_id)
        .exec(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("order entry"));
    }
    Ok(())
}
