use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::auth::{verify_auth, Claims};
use crate::database::models::Role;
use crate::error::ApiError;
use crate::state::AppState;

/// Session of the caller, taken from a verified bearer token.
///
/// Handlers that mutate state take this as their first extractor, so an
/// unauthenticated request is rejected with 401 before anything else runs.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { user_id: claims.user_id, username: claims.username, role: claims.role }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = verify_auth(&parts.headers, &state.tokens)?;
        Ok(AuthUser::from(claims))
    }
}
