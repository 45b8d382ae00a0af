use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionError, TransactionTrait};
use uuid::Uuid;

use models::errors::ModelError;

use crate::auth::domain::{AuthUser, Credentials, RegisterInput};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_auth_user(u: models::user::Model) -> AuthUser {
    AuthUser { id: u.id, username: u.username, is_staff: u.is_staff }
}

fn auth_error(e: ModelError) -> AuthError {
    match e {
        ModelError::Duplicate(_) => AuthError::Conflict,
        ModelError::Db(msg) => AuthError::Repository(msg),
        other => AuthError::Validation(other.to_string()),
    }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find()
            .filter(models::user::Column::Username.eq(username.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_auth_user))
    }

    async fn create_user(
        &self,
        input: &RegisterInput,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError> {
        let new_user = models::user::NewUser {
            username: input.username.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            is_staff: false,
        };
        let created = self
            .db
            .transaction::<_, models::user::Model, ModelError>(move |txn| {
                Box::pin(async move {
                    let user = models::user::create(txn, new_user).await?;
                    models::user_profile::create(txn, user.id).await?;
                    models::user_credentials::upsert_password(txn, user.id, password_hash, &password_algorithm).await?;
                    Ok(user)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => auth_error(ModelError::from(db)),
                TransactionError::Transaction(m) => auth_error(m),
            })?;
        Ok(to_auth_user(created))
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::Entity::find()
            .filter(models::user_credentials::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }
}
