use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, RegisterInput};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError>;
    /// Creates the account, its profile and its credentials as one unit:
    /// either all three rows exist afterwards or none do. A username that is
    /// already taken yields [`AuthError::Conflict`].
    async fn create_user(
        &self,
        input: &RegisterInput,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: username
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: user_id
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(username).cloned())
        }

        async fn create_user(
            &self,
            input: &RegisterInput,
            password_hash: String,
            password_algorithm: String,
        ) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(&input.username) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser { id: Uuid::new_v4(), username: input.username.clone(), is_staff: false };
            let c = Credentials { user_id: user.id, password_hash, password_algorithm };
            self.creds.lock().unwrap().insert(user.id, c);
            users.insert(input.username.clone(), user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }
    }
}
