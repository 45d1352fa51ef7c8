/// Signup and signin
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::db::{StoreError, UserStore};
use crate::error::{AppError, Result};
use crate::models::{User, UserProfile};
use crate::security::{hash_password, jwt, verify_password};

/// Body returned by both signin and signup
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub result: UserProfile,
    pub token: String,
}

/// Fields accepted by signup, already shape-validated by the handler
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub confirm_password: Option<&'a str>,
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn signin(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let user = self
            .users
            .get_user(email.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("User doesn't exist".to_string()))?;

        let candidate = password.to_string();
        let stored = user.password.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&candidate, &stored))
            .await
            .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))??;

        if !valid {
            tracing::info!(user_id = %user.email, "signin rejected: bad password");
            return Err(AppError::BadRequest("Invalid credentials".to_string()));
        }

        tracing::info!(user_id = %user.email, "user signed in");
        issue_session(&user)
    }

    pub async fn signup(&self, account: NewAccount<'_>) -> Result<AuthResponse> {
        if let Some(confirm) = account.confirm_password {
            if confirm != account.password {
                return Err(AppError::BadRequest("Passwords don't match".to_string()));
            }
        }

        let email = account.email.trim().to_string();
        if self.users.get_user(&email).await?.is_some() {
            return Err(AppError::BadRequest("User already exists".to_string()));
        }

        let password = account.password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))??;

        let user = User {
            email,
            password: password_hash,
            name: format!("{} {}", account.first_name.trim(), account.last_name.trim()),
        };

        // The conditional put catches a concurrent signup for the same email
        match self.users.create_user(&user).await {
            Ok(()) => {}
            Err(StoreError::ConditionFailed) => {
                return Err(AppError::BadRequest("User already exists".to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.email, "user signed up");
        issue_session(&user)
    }

    pub async fn health_check(&self) -> Result<()> {
        self.users.health_check().await?;
        Ok(())
    }
}

fn issue_session(user: &User) -> Result<AuthResponse> {
    let token = jwt::generate_session_token(&user.email, &user.email)
        .map_err(|e| AppError::Internal(format!("failed to issue session token: {}", e)))?;

    Ok(AuthResponse {
        result: UserProfile::from(user),
        token,
    })
}
