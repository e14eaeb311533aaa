use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::{self, TokenKind};
use crate::error::{ApiError, AppError};
use crate::AppState;

#[derive(Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    refresh: String,
}

#[derive(Serialize)]
pub struct TokenPair {
    access: String,
    refresh: String,
}

#[derive(Serialize)]
pub struct AccessToken {
    access: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/token/", post(obtain_token))
        .route("/api/token/refresh/", post(refresh_token))
}

fn token_error(e: jsonwebtoken::errors::Error) -> AppError {
    AppError::Internal(format!("could not sign token: {e}"))
}

async fn obtain_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let mut errors = crate::forms::FormErrors::new();
    if req.username.trim().is_empty() {
        errors.insert("username".into(), "This field is required.".into());
    }
    if req.password.is_empty() {
        errors.insert("password".into(), "This field is required.".into());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors).into());
    }

    let user = auth::authenticate(&state.db, req.username.trim(), &req.password).await?;
    tracing::info!(user_id = user.id, "issued token pair");

    Ok(Json(TokenPair {
        access: state.keys.issue(user.id, TokenKind::Access).map_err(token_error)?,
        refresh: state.keys.issue(user.id, TokenKind::Refresh).map_err(token_error)?,
    }))
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    if req.refresh.trim().is_empty() {
        return Err(AppError::invalid("refresh", "This field is required.").into());
    }

    let claims = state
        .keys
        .verify(req.refresh.trim(), TokenKind::Refresh)
        .map_err(|_| AppError::Unauthorized(auth::BAD_TOKEN.to_string()))?;

    Ok(Json(AccessToken {
        access: state
            .keys
            .issue(claims.user_id, TokenKind::Access)
            .map_err(token_error)?,
    }))
}
