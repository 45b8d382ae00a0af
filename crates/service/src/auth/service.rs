use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{info, debug, instrument};
use uuid::Uuid;

use super::domain::{RegisterInput, LoginInput, AuthUser, AuthSession};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Token lifetime in hours.
pub const TOKEN_TTL_HOURS: i64 = 12;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub password_algorithm: String,
}

/// JWT payload carried in the auth cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.uid).map_err(|e| AuthError::TokenError(e.to_string()))
    }
}

/// Sign a token for `user` that expires after [`TOKEN_TTL_HOURS`].
pub fn issue_token(secret: &str, user: &AuthUser) -> Result<String, AuthError> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
    let claims = Claims { sub: user.username.clone(), uid: user.id.to_string(), exp };
    encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

/// Check signature and expiry.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig { jwt_secret: None, password_algorithm: "argon2".into() });
    /// let input = RegisterInput { username: "jonas".into(), password: "Secret123".into(), ..Default::default() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.username, "jonas");
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        if input.username.trim().is_empty() {
            return Err(AuthError::Validation("username required".into()));
        }
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        if let Some(existing) = self.repo.find_user_by_username(&input.username).await? {
            debug!("user exists: {}", existing.username);
            return Err(AuthError::Conflict);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = self
            .repo
            .create_user(&input, hash, self.cfg.password_algorithm.clone())
            .await?;
        info!(user_id = %user.id, username = %user.username, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and optionally issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig { jwt_secret: Some("secret".into()), password_algorithm: "argon2".into() });
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { username: "ona".into(), password: "Passw0rd".into(), ..Default::default() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { username: "ona".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.username, "ona");
    /// assert!(session.token.is_some());
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_username(&input.username)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        let token = match &self.cfg.jwt_secret {
            Some(secret) => Some(issue_token(secret, &user)?),
            None => None,
        };
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> AuthService<MockAuthRepository> {
        AuthService::new(
            Arc::new(MockAuthRepository::default()),
            AuthConfig { jwt_secret: Some("test-secret".into()), password_algorithm: "argon2".into() },
        )
    }

    fn reg(username: &str, password: &str) -> RegisterInput {
        RegisterInput { username: username.into(), password: password.into(), ..Default::default() }
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let err = svc().register(reg("jonas", "short")).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let s = svc();
        s.register(reg("jonas", "Passw0rd!")).await.unwrap();
        let err = s.register(reg("jonas", "Passw0rd!")).await.unwrap_err();
        assert_eq!(err.code(), AuthError::Conflict.code());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let s = svc();
        s.register(reg("ona", "Passw0rd!")).await.unwrap();
        let err = s.login(LoginInput { username: "ona".into(), password: "nope-nope".into() }).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn issued_token_verifies_to_the_user() {
        let s = svc();
        let user = s.register(reg("ona", "Passw0rd!")).await.unwrap();
        let session = s.login(LoginInput { username: "ona".into(), password: "Passw0rd!".into() }).await.unwrap();
        let claims = verify_token("test-secret", session.token.as_deref().unwrap()).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.sub, "ona");
        assert!(verify_token("other-secret", session.token.as_deref().unwrap()).is_err());
    }
}
