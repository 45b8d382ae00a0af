use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::{info, instrument};

use models::{user, user_profile};

use crate::errors::ServiceError;

/// Create a profile for every user that lacks one and return how many were
/// created. Each profile is committed on its own; the first failure stops the
/// run and earlier inserts stay.
#[instrument(skip(db))]
pub async fn provision_missing_profiles<C: ConnectionTrait>(db: &C) -> Result<u64, ServiceError> {
    let missing = user::Entity::find()
        .left_join(user_profile::Entity)
        .filter(user_profile::Column::Id.is_null())
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;

    let mut created = 0u64;
    for u in missing {
        user_profile::create(db, u.id).await?;
        created += 1;
    }
    info!(created, "user profiles provisioned");
    Ok(created)
}
