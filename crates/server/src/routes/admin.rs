//! Staff-only JSON endpoints for the catalog and order bookkeeping.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use models::order::OrderStatus;
use models::{car_model, order, order_entry, service as service_entity};
use service::catalog_service;
use service::errors::ServiceError;
use service::order_service::EntryView;

use crate::auth::RequireUser;
use crate::errors::AppError;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: i16,
}

fn parse_id(raw: &str, entity: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Service(ServiceError::not_found(entity)))
}

pub async fn list_car_models(
    State(state): State<ServerState>,
    user: RequireUser,
) -> Result<Json<Vec<car_model::Model>>, AppError> {
    let items = catalog_service::list_car_models(&state.db, &user.requester()).await.map_err(AppError::api)?;
    Ok(Json(items))
}

pub async fn create_car_model(
    State(state): State<ServerState>,
    user: RequireUser,
    Json(input): Json<car_model::CarModelInput>,
) -> Result<(StatusCode, Json<car_model::Model>), AppError> {
    let created = catalog_service::create_car_model(&state.db, &user.requester(), input)
        .await
        .map_err(AppError::api)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_car_model(
    State(state): State<ServerState>,
    user: RequireUser,
    Path(id): Path<String>,
    Json(input): Json<car_model::CarModelInput>,
) -> Result<Json<car_model::Model>, AppError> {
    let id = parse_id(&id, "car model")?;
    let updated = catalog_service::update_car_model(&state.db, &user.requester(), id, input)
        .await
        .map_err(AppError::api)?;
    Ok(Json(updated))
}

pub async fn delete_car_model(
    State(state): State<ServerState>,
    user: RequireUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "car model")?;
    catalog_service::delete_car_model(&state.db, &user.requester(), id).await.map_err(AppError::api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_services(
    State(state): State<ServerState>,
    user: RequireUser,
) -> Result<Json<Vec<service_entity::Model>>, AppError> {
    let items = catalog_service::list_services(&state.db, &user.requester()).await.map_err(AppError::api)?;
    Ok(Json(items))
}

pub async fn create_service(
    State(state): State<ServerState>,
    user: RequireUser,
    Json(input): Json<service_entity::ServiceInput>,
) -> Result<(StatusCode, Json<service_entity::Model>), AppError> {
    let created = catalog_service::create_service(&state.db, &user.requester(), input)
        .await
        .map_err(AppError::api)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_service(
    State(state): State<ServerState>,
    user: RequireUser,
    Path(id): Path<String>,
    Json(input): Json<service_entity::ServiceInput>,
) -> Result<Json<service_entity::Model>, AppError> {
    let id = parse_id(&id, "service")?;
    let updated = catalog_service::update_service(&state.db, &user.requester(), id, input)
        .await
        .map_err(AppError::api)?;
    Ok(Json(updated))
}

/// Also drops every order entry billing this service.
pub async fn delete_service(
    State(state): State<ServerState>,
    user: RequireUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "service")?;
    catalog_service::delete_service(&state.db, &user.requester(), id).await.map_err(AppError::api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_order_status(
    State(state): State<ServerState>,
    user: RequireUser,
    Path(id): Path<String>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_id(&id, "order")?;
    let status = OrderStatus::from_code(payload.status)
        .ok_or_else(|| AppError::BadRequest(json!({ "errors": { "status": [format!("{} is not a valid status.", payload.status)] } })))?;
    let updated: order::Model = catalog_service::set_order_status(&state.db, &user.requester(), id, status)
        .await
        .map_err(AppError::api)?;
    Ok(Json(json!({
        "id": updated.id,
        "status": updated.status.code(),
        "status_label": updated.status.label(),
    })))
}

pub async fn list_entries(
    State(state): State<ServerState>,
    user: RequireUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<EntryView>>, AppError> {
    let id = parse_id(&id, "order")?;
    let items = catalog_service::list_entries(&state.db, &user.requester(), id).await.map_err(AppError::api)?;
    Ok(Json(items))
}

pub async fn add_entry(
    State(state): State<ServerState>,
    user: RequireUser,
    Path(id): Path<String>,
    Json(input): Json<order_entry::EntryInput>,
) -> Result<(StatusCode, Json<order_entry::Model>), AppError> {
    let id = parse_id(&id, "order")?;
    let created = catalog_service::add_entry(&state.db, &user.requester(), id, input)
        .await
        .map_err(AppError::api)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_entry(
    State(state): State<ServerState>,
    user: RequireUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "order entry")?;
    catalog_service::delete_entry(&state.db, &user.requester(), id).await.map_err(AppError::api)?;
    Ok(StatusCode::NO_CONTENT)
}
