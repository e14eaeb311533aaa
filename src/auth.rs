use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ApiError, AppError};
use crate::models::User;
use crate::AppState;

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";
pub const BAD_TOKEN: &str = "Given token not valid for any token type";
const NO_CREDENTIALS: &str = "Authentication credentials were not provided.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenKind,
    pub user_id: i64,
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::minutes(config.access_token_minutes),
            Duration::days(config.refresh_token_days),
        )
    }

    pub fn issue(&self, user_id: i64, kind: TokenKind) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            token_type: kind,
            user_id,
            jti: Uuid::new_v4().simple().to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Decode `token`, checking signature, expiry and that it is a `kind` token.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        if data.claims.token_type != kind {
            return Err(ErrorKind::InvalidToken.into());
        }
        Ok(data.claims)
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Check a username/password pair against the users table.
pub async fn authenticate(db: &SqlitePool, username: &str, password: &str) -> Result<User, AppError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(db)
        .await?;

    match user {
        Some(user) if user.is_active && verify_password(password, &user.password_hash) => Ok(user),
        _ => Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string())),
    }
}

/// Active user resolved from a `Bearer` access token.
pub struct ApiUser(pub User);

impl FromRequestParts<AppState> for ApiUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized(NO_CREDENTIALS.to_string()))?;

        let claims = state
            .keys
            .verify(token, TokenKind::Access)
            .map_err(|_| AppError::Unauthorized(BAD_TOKEN.to_string()))?;

        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(claims.user_id)
            .fetch_optional(&state.db)
            .await
            .map_err(AppError::from)?;

        match user {
            Some(user) if user.is_active => Ok(ApiUser(user)),
            _ => Err(AppError::Unauthorized("User not found".to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret", Duration::minutes(5), Duration::days(1))
    }

    #[test]
    fn access_token_roundtrip() {
        let keys = keys();
        let token = keys.issue(42, TokenKind::Access).unwrap();
        let claims = keys.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.token_type, TokenKind::Access);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let keys = keys();
        let token = keys.issue(42, TokenKind::Refresh).unwrap();
        assert!(keys.verify(&token, TokenKind::Access).is_err());
        assert!(keys.verify(&token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = JwtKeys::new("other", Duration::minutes(5), Duration::days(1));
        let token = other.issue(1, TokenKind::Access).unwrap();
        assert!(keys().verify(&token, TokenKind::Access).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::new("test-secret", Duration::minutes(-10), Duration::days(1));
        let token = keys.issue(1, TokenKind::Access).unwrap();
        assert!(keys.verify(&token, TokenKind::Access).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("hunter2", "not-a-hash"));
    }
}
