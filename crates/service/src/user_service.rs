use uuid::Uuid;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, ActiveModelTrait, Set};

use models::user;
use crate::errors::ServiceError;

/// Get a user by id.
pub async fn get_user(db: &DatabaseConnection, id: Uuid) -> Result<Option<user::Model>, ServiceError> {
    let found = user::Entity::find_by_id(id).one(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(found)
}

/// Active user for an authenticated request; deactivated accounts count as absent.
pub async fn get_active_user(db: &DatabaseConnection, id: Uuid) -> Result<Option<user::Model>, ServiceError> {
    Ok(get_user(db, id).await?.filter(|u| u.is_active))
}

pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<user::Model>, ServiceError> {
    user::Entity::find()
        .filter(user::Column::Username.eq(username.to_string()))
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Grant or revoke staff rights.
pub async fn set_staff(db: &DatabaseConnection, id: Uuid, is_staff: bool) -> Result<user::Model, ServiceError> {
    let mut am: user::ActiveModel = get_user(db, id).await?
        .ok_or_else(|| ServiceError::not_found("user"))?
        .into();
    am.is_staff = Set(is_staff);
    let updated = am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    Ok(updated)
}

/// Grant or revoke staff rights for the account named `username`.
pub async fn set_staff_by_username(db: &DatabaseConnection, username: &str, is_staff: bool) -> Result<user::Model, ServiceError> {
    let found = find_by_username(db, username)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    if found.is_staff == is_staff {
        return Ok(found);
    }
    set_staff(db, found.id, is_staff).await
}
