//! Authentication service
//!
//! Password checks run on the blocking pool since bcrypt is deliberately slow.

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::{LoginRequest, LoginResponse};
use crate::models::{User, UserResponse, UserRole};
use crate::store::StoreGateway;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::jwt::{generate_token, JwtConfig};

pub struct AuthService {
    store: StoreGateway,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(store: StoreGateway, jwt: JwtConfig) -> Self {
        Self { store, jwt }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let user = match self.store.user_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                warn!("Login attempt for unknown user {}", request.email);
                return Err(invalid());
            }
        };

        if !verify_password(request.password, user.password_hash.clone()).await? {
            warn!("Wrong password for {}", user.email);
            return Err(invalid());
        }

        let token = generate_token(&user, &self.jwt)?;
        info!("✅ {} logged in as {}", user.email, user.role);

        Ok(LoginResponse::bearer(
            token,
            self.jwt.expiration as i64,
            UserResponse::from(user),
        ))
    }

    pub async fn current_user(&self, email: &str) -> AppResult<UserResponse> {
        self.store
            .user_by_email(email)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
    }

    /// Create the initial admin account unless a user with that email exists
    pub async fn ensure_admin(&self, email: &str, password: &str) -> AppResult<bool> {
        if self.store.user_by_email(email).await?.is_some() {
            return Ok(false);
        }

        let user = User {
            id: Uuid::new_v4(),
            name: "Administrator".to_string(),
            email: email.to_string(),
            password_hash: hash_password(password.to_string()).await?,
            role: UserRole::Admin,
            created_at: Utc::now(),
        };
        self.store.insert_user(user).await?;
        info!("👤 Created admin account {}", email);
        Ok(true)
    }
}

pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Hash(e.to_string()))
}

pub async fn verify_password(password: String, password_hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
        .map_err(|e| AppError::Hash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn service() -> AuthService {
        let gateway = StoreGateway::new(Arc::new(MemoryStore::new()), Duration::from_secs(5), 0);
        AuthService::new(
            gateway,
            JwtConfig {
                secret: "test-secret".to_string(),
                expiration: 600,
            },
        )
    }

    #[tokio::test]
    async fn test_admin_bootstrap_then_login() {
        let service = service();
        assert!(service.ensure_admin("admin@fleet.com", "s3cret!").await.unwrap());
        assert!(!service.ensure_admin("admin@fleet.com", "other").await.unwrap());

        let response = service
            .login(LoginRequest {
                email: "admin@fleet.com".to_string(),
                password: "s3cret!".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.user.role, UserRole::Admin);
        assert!(!response.token.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let service = service();
        service.ensure_admin("admin@fleet.com", "s3cret!").await.unwrap();

        let result = service
            .login(LoginRequest {
                email: "admin@fleet.com".to_string(),
                password: "guess".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
