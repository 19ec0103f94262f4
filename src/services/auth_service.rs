use serde::Serialize;

use crate::auth::{hash_password, verify_password};
use crate::database::models::user::{normalize_username, LoginRequest, RegisterRequest};
use crate::database::models::{NewUser, Role, User};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: Role,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self { id: user.id, username: user.username, name: user.name, role: user.role }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

pub struct AuthService<'a> {
    state: &'a AppState,
}

impl<'a> AuthService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Unknown user, inactive user and wrong password are indistinguishable.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ApiError> {
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(ApiError::bad_request("Username and password are required"));
        }

        let username = normalize_username(&request.username);
        let credentials = match self.state.users.find_credentials(&username).await? {
            Some(c) => c,
            None => {
                tracing::info!(username = %username, "Login rejected: unknown or inactive user");
                return Err(ApiError::unauthorized("Invalid credentials"));
            }
        };

        let password = request.password;
        let hash = credentials.password_hash.clone();
        if !off_runtime(move || verify_password(&password, &hash)).await?? {
            tracing::info!(username = %username, "Login rejected: wrong password");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }

        let token = self.state.tokens.generate_token(&credentials.user)?;
        tracing::info!(username = %username, "Login succeeded");
        Ok(LoginResponse { token, user: credentials.user.into() })
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, ApiError> {
        request.validate()?;
        let password = request.password.clone();
        let password_hash = off_runtime(move || hash_password(&password)).await??;
        let new_user = NewUser {
            username: normalize_username(&request.username),
            password_hash,
            name: request.name.trim().to_string(),
            role: Role::Admin,
        };
        let user = self.state.users.insert(new_user).await?;
        tracing::info!(username = %user.username, "Admin user registered");
        Ok(user)
    }
}

/// Argon2 is deliberately slow; keep it off the async worker threads.
async fn off_runtime<F, T>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!("Password task failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn password_work_runs_on_the_blocking_pool() {
        let caller = std::thread::current().id();
        let worker = off_runtime(|| std::thread::current().id()).await.unwrap();
        assert_ne!(caller, worker);
    }

    #[tokio::test]
    async fn hashes_produced_off_runtime_verify() {
        let hash = off_runtime(|| hash_password("secreto123")).await.unwrap().unwrap();
        let ok = off_runtime(move || verify_password("secreto123", &hash)).await.unwrap().unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn panicking_work_is_an_internal_error() {
        let err = off_runtime(|| -> u8 { panic!("boom") }).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
    }
}
