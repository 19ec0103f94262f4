//! Bearer token issuance and verification.

pub mod password;

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::database::models::{Role, User};

pub use password::{hash_password, verify_password, PasswordError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    Generation(#[from] jsonwebtoken::errors::Error),
}

/// Failure modes of [`verify_auth`]; both surface as 401.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    MissingToken,

    #[error("Token invalid or expired")]
    InvalidToken,
}

/// Signs and checks session tokens with the configured HMAC secret.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    expiry: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").field("expiry", &self.expiry).finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(security: &SecurityConfig) -> Self {
        Self {
            secret: security.jwt_secret.clone(),
            expiry: Duration::hours(security.jwt_expiry_hours as i64),
        }
    }

    pub fn generate_token(&self, user: &User) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        let now = Utc::now();
        let claims = Claims {
            user_id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            exp: (now + self.expiry).timestamp(),
            iat: now.timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))?)
    }

    /// Decoded claims when the signature and expiry check out, `None` otherwise.
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        if self.secret.is_empty() {
            return None;
        }
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        match decode::<Claims>(token, &key, &Validation::default()) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Rejected token: {}", e);
                None
            }
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn get_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

pub fn verify_auth(headers: &HeaderMap, tokens: &TokenService) -> Result<Claims, AuthError> {
    let token = get_token_from_headers(headers).ok_or(AuthError::MissingToken)?;
    tokens.verify_token(token).ok_or(AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service(secret: &str) -> TokenService {
        TokenService { secret: secret.to_string(), expiry: Duration::hours(168) }
    }

    fn admin() -> User {
        User {
            id: "64b0c0ffee0000000000beef".into(),
            username: "luisa".into(),
            name: "Luisa".into(),
            role: Role::Admin,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn issued_tokens_verify_for_seven_days() {
        let tokens = service("s3cret");
        let token = tokens.generate_token(&admin()).unwrap();
        let claims = tokens.verify_token(&token).unwrap();
        assert_eq!(claims.user_id, "64b0c0ffee0000000000beef");
        assert_eq!(claims.username, "luisa");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn wrong_secret_or_garbage_is_absent() {
        let token = service("one").generate_token(&admin()).unwrap();
        assert!(service("two").verify_token(&token).is_none());
        assert!(service("one").verify_token("not.a.token").is_none());
    }

    #[test]
    fn empty_secret_refuses_to_sign() {
        assert!(matches!(service("").generate_token(&admin()), Err(TokenError::MissingSecret)));
    }

    #[test]
    fn extracts_only_bearer_tokens() {
        assert_eq!(get_token_from_headers(&bearer("abc")), Some("abc"));
        assert_eq!(get_token_from_headers(&HeaderMap::new()), None);

        let mut basic = HeaderMap::new();
        basic.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(get_token_from_headers(&basic), None);
    }

    #[test]
    fn verify_auth_distinguishes_missing_and_invalid() {
        let tokens = service("s3cret");
        assert_eq!(verify_auth(&HeaderMap::new(), &tokens), Err(AuthError::MissingToken));
        assert_eq!(verify_auth(&bearer("nope"), &tokens), Err(AuthError::InvalidToken));

        let token = tokens.generate_token(&admin()).unwrap();
        assert_eq!(verify_auth(&bearer(&token), &tokens).unwrap().username, "luisa");
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let tokens = service("s3cret");
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: "64b0c0ffee0000000000beef".into(),
            username: "luisa".into(),
            role: Role::Admin,
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"s3cret")).unwrap();

        assert!(tokens.verify_token(&token).is_none());
        assert_eq!(verify_auth(&bearer(&token), &tokens), Err(AuthError::InvalidToken));

        let lapsed = TokenService { secret: "s3cret".into(), expiry: Duration::hours(-2) };
        let token = lapsed.generate_token(&admin()).unwrap();
        assert_eq!(verify_auth(&bearer(&token), &tokens), Err(AuthError::InvalidToken));
    }
}
